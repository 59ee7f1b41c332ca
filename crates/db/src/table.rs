use sea_query::Iden;

#[derive(Iden, Clone)]
pub enum Principal {
    Table,
    Id,
    Role,
    ExternalIdentityId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum Session {
    Table,
    Id,
    PrincipalId,
    CreatedAt,
    ExpiresAt,
}

#[derive(Iden, Clone)]
pub enum Foodcourt {
    Table,
    Id,
    Name,
    CommissionRateBp,
    Timezone,
    Active,
    CreatedAt,
}

#[derive(Iden, Clone)]
pub enum Restaurant {
    Table,
    Id,
    FoodcourtId,
    OwnerPrincipalId,
    Name,
    CommissionRateBp,
    Timezone,
    Published,
    Location,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum DiningTable {
    Table,
    Id,
    FoodcourtId,
    Label,
    CreatedAt,
}

#[derive(Iden, Clone)]
pub enum Product {
    Table,
    Id,
    RestaurantId,
    Name,
    BasePriceMinor,
    Available,
    Variants,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum CustomerOrder {
    Table,
    Id,
    RestaurantId,
    OrderNumber,
    DiningTableId,
    CustomerPrincipalId,
    CustomerName,
    CustomerPhone,
    DeliveryType,
    Status,
    TotalMinor,
    SpecialInstructions,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum OrderItem {
    Table,
    Id,
    OrderId,
    ProductId,
    ProductName,
    VariantLabel,
    Quantity,
    UnitPriceMinor,
    LineTotalMinor,
    SpecialInstructions,
}

#[derive(Iden, Clone)]
pub enum OrderNumberCounter {
    Table,
    RestaurantId,
    LocalDate,
    Value,
}

#[derive(Iden, Clone)]
pub enum Payment {
    Table,
    Id,
    OrderId,
    RestaurantId,
    AmountMinor,
    Currency,
    Method,
    Status,
    CommissionMinor,
    NetMinor,
    ProviderRef,
    ProviderMetadata,
    Details,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum Refund {
    Table,
    Id,
    PaymentId,
    AmountMinor,
    Reason,
    ProviderRefundRef,
    CreatedAt,
}

#[derive(Iden, Clone)]
pub enum ProcessedWebhook {
    Table,
    Provider,
    ProviderEventId,
    ProcessedAt,
}

#[derive(Iden, Clone)]
pub enum Employee {
    Table,
    Id,
    RestaurantId,
    PrincipalId,
    Name,
    Phone,
    Email,
    Role,
    HourlyWageMinor,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum Shift {
    Table,
    Id,
    EmployeeId,
    ScheduledStart,
    ScheduledEnd,
    ActualStart,
    ActualEnd,
    BreakMinutes,
    Status,
    Notes,
    PayMinor,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum InviteToken {
    Table,
    Id,
    Token,
    RestaurantId,
    GrantedRole,
    HourlyWageMinor,
    ExpiresAt,
    MaxUses,
    UsedCount,
    Status,
    CreatedByPrincipalId,
    CreatedAt,
}

#[derive(Iden, Clone)]
pub enum Outbox {
    Table,
    Seq,
    EventId,
    AggregateType,
    AggregateId,
    Kind,
    Payload,
    CreatedAt,
}

#[derive(Iden, Clone)]
pub enum OutboxCursor {
    Table,
    Subscriber,
    Position,
    UpdatedAt,
}

#[derive(Iden, Clone)]
pub enum Lease {
    Table,
    Name,
    Holder,
    ExpiresAt,
}

#[derive(Iden, Clone)]
pub enum Notification {
    Table,
    Id,
    DedupeKey,
    RecipientPrincipalId,
    Kind,
    Body,
    CreatedAt,
}
