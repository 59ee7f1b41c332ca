mod catalog;
mod notification;
mod order;
mod outbox;
mod payment;
mod principal;
mod workforce;

use sqlx_migrator::vec_box;

pub struct Migration;

/// Implements a table-creating [`sqlx_migrator::Operation`] from a statement
/// builder; `down` drops the table.
macro_rules! table_operation {
    ($operation:ident, $create:ident, $table:expr) => {
        #[async_trait::async_trait]
        impl sqlx_migrator::Operation<sqlx::Sqlite> for $operation {
            async fn up(
                &self,
                connection: &mut sqlx::SqliteConnection,
            ) -> Result<(), sqlx_migrator::Error> {
                let statement = $create().to_string(sea_query::SqliteQueryBuilder);
                sqlx::query(&statement).execute(connection).await?;

                Ok(())
            }

            async fn down(
                &self,
                connection: &mut sqlx::SqliteConnection,
            ) -> Result<(), sqlx_migrator::Error> {
                let statement = sea_query::Table::drop()
                    .table($table)
                    .to_owned()
                    .to_string(sea_query::SqliteQueryBuilder);
                sqlx::query(&statement).execute(connection).await?;

                Ok(())
            }
        }
    };
}

/// Implements an index-creating operation from a raw pair of statements.
macro_rules! sql_operation {
    ($operation:ident, $up:expr, $down:expr) => {
        #[async_trait::async_trait]
        impl sqlx_migrator::Operation<sqlx::Sqlite> for $operation {
            async fn up(
                &self,
                connection: &mut sqlx::SqliteConnection,
            ) -> Result<(), sqlx_migrator::Error> {
                sqlx::query($up).execute(connection).await?;

                Ok(())
            }

            async fn down(
                &self,
                connection: &mut sqlx::SqliteConnection,
            ) -> Result<(), sqlx_migrator::Error> {
                sqlx::query($down).execute(connection).await?;

                Ok(())
            }
        }
    };
}

pub(crate) use sql_operation;
pub(crate) use table_operation;

sqlx_migrator::sqlite_migration!(
    Migration,
    "foodcourtio",
    "m0001",
    vec_box![],
    vec_box![
        principal::CreatePrincipal,
        principal::CreatePrincipalExternalIdx,
        principal::CreateSession,
        catalog::CreateFoodcourt,
        catalog::CreateRestaurant,
        catalog::CreateDiningTable,
        catalog::CreateProduct,
        order::CreateCustomerOrder,
        order::CreateOrderNumberIdx,
        order::CreateOrderItem,
        order::CreateOrderNumberCounter,
        payment::CreatePayment,
        payment::CreatePaymentOrderIdx,
        payment::CreatePaymentProviderRefIdx,
        payment::CreateRefund,
        payment::CreateProcessedWebhook,
        workforce::CreateEmployee,
        workforce::CreateEmployeePhoneIdx,
        workforce::CreateShift,
        workforce::CreateShiftEmployeeIdx,
        workforce::CreateInviteToken,
        workforce::CreateInviteTokenIdx,
        outbox::CreateOutbox,
        outbox::CreateOutboxCursor,
        outbox::CreateLease,
        notification::CreateNotification,
    ]
);
