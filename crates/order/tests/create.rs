use foodcourtio_order::{CreateOrderInput, CreateOrderItemInput, DeliveryType, OrderStatus};
use foodcourtio_shared::Error;

mod helpers;

fn input(restaurant_id: &str, items: Vec<CreateOrderItemInput>) -> CreateOrderInput {
    CreateOrderInput {
        restaurant_id: restaurant_id.to_owned(),
        table_id: None,
        items,
        customer_name: "Jane Doe".to_owned(),
        customer_phone: "+79001234567".to_owned(),
        delivery_type: DeliveryType::DineIn,
        special_instructions: None,
        customer_principal_id: None,
    }
}

fn line(product_id: &str, quantity: i64) -> CreateOrderItemInput {
    CreateOrderItemInput {
        product_id: product_id.to_owned(),
        variant_label: None,
        quantity,
        special_instructions: None,
    }
}

#[tokio::test]
async fn totals_are_recomputed_from_snapshots() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let ramen = helpers::seed_product(
        &fx.pool,
        &fx.restaurant_id,
        900,
        true,
        Some(r#"[{"label":"Large","price_modifier_minor":300}]"#),
    )
    .await?;
    let tea = helpers::seed_product(&fx.pool, &fx.restaurant_id, 150, true, None).await?;

    let order = fx
        .engine
        .create(input(
            &fx.restaurant_id,
            vec![
                CreateOrderItemInput {
                    variant_label: Some("Large".to_owned()),
                    ..line(&ramen, 2)
                },
                line(&tea, 3),
            ],
        ))
        .await?;

    // 2 x (900 + 300) + 3 x 150
    assert_eq!(order.total_minor, 2850);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].unit_price_minor, 1200);
    assert_eq!(order.items[0].line_total_minor, 2400);
    assert!(order.order_number.ends_with("-001"));

    let events = foodcourtio_store::fetch_after(&fx.pool, 0, 10).await?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.kind(), "OrderCreated");

    Ok(())
}

#[tokio::test]
async fn unknown_variant_is_rejected() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let ramen = helpers::seed_product(&fx.pool, &fx.restaurant_id, 900, true, None).await?;

    let result = fx
        .engine
        .create(input(
            &fx.restaurant_id,
            vec![CreateOrderItemInput {
                variant_label: Some("Gigantic".to_owned()),
                ..line(&ramen, 1)
            }],
        ))
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn unavailable_product_is_rejected() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let ramen = helpers::seed_product(&fx.pool, &fx.restaurant_id, 900, false, None).await?;

    let result = fx
        .engine
        .create(input(&fx.restaurant_id, vec![line(&ramen, 1)]))
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn product_of_another_restaurant_is_rejected() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let (_, other_restaurant) = helpers::seed_restaurant(&fx.pool, "UTC", true, true).await?;
    let foreign = helpers::seed_product(&fx.pool, &other_restaurant, 900, true, None).await?;

    let result = fx
        .engine
        .create(input(&fx.restaurant_id, vec![line(&foreign, 1)]))
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn unpublished_restaurant_rejects_orders() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let (_, dark) = helpers::seed_restaurant(&fx.pool, "UTC", false, true).await?;
    let ramen = helpers::seed_product(&fx.pool, &dark, 900, true, None).await?;

    let result = fx.engine.create(input(&dark, vec![line(&ramen, 1)])).await;
    assert!(matches!(result, Err(Error::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn inactive_foodcourt_rejects_orders() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let (_, dormant) = helpers::seed_restaurant(&fx.pool, "UTC", true, false).await?;
    let ramen = helpers::seed_product(&fx.pool, &dormant, 900, true, None).await?;

    let result = fx.engine.create(input(&dormant, vec![line(&ramen, 1)])).await;
    assert!(matches!(result, Err(Error::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn table_must_belong_to_the_foodcourt() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;
    let ramen = helpers::seed_product(&fx.pool, &fx.restaurant_id, 900, true, None).await?;

    let (other_foodcourt, _) = helpers::seed_restaurant(&fx.pool, "UTC", true, true).await?;
    let foreign_table = helpers::seed_table(&fx.pool, &other_foodcourt).await?;

    let mut request = input(&fx.restaurant_id, vec![line(&ramen, 1)]);
    request.table_id = Some(foreign_table);
    let result = fx.engine.create(request).await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let own_table = helpers::seed_table(&fx.pool, &fx.foodcourt_id).await?;
    let mut request = input(&fx.restaurant_id, vec![line(&ramen, 1)]);
    request.table_id = Some(own_table.clone());
    let order = fx.engine.create(request).await?;
    assert_eq!(order.dining_table_id, Some(own_table));

    Ok(())
}

#[tokio::test]
async fn empty_orders_are_rejected() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;

    let result = fx.engine.create(input(&fx.restaurant_id, Vec::new())).await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let free = helpers::seed_product(&fx.pool, &fx.restaurant_id, 0, true, None).await?;
    let result = fx
        .engine
        .create(input(&fx.restaurant_id, vec![line(&free, 1)]))
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn missing_restaurant_is_not_found() -> anyhow::Result<()> {
    let fx = helpers::setup_fixture().await?;

    let result = fx
        .engine
        .create(input("nope", vec![line("also-nope", 1)]))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    Ok(())
}
