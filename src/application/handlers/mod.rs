//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod card;
pub mod subscription;
pub mod webhook;

pub use card::{
    DeleteAllCardsCommand, DeleteAllCardsHandler, DeleteAllCardsResult, DeleteCardCommand,
    DeleteCardHandler, GetCardHandler, GetCardQuery, ListCardsHandler, ListCardsQuery,
    RegisterCardCommand, RegisterCardHandler, RegisterCardResult, SetDefaultCardCommand,
    SetDefaultCardHandler, SetDefaultCardResult, UpdateCardCommand, UpdateCardHandler,
    UpdateCardResult,
};
pub use subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
    GatewayCallSettings, GetActiveSubscriptionHandler, GetActiveSubscriptionQuery,
    GetProductHandler, GetProductQuery, GetSubscriptionHandler, GetSubscriptionHistoryHandler,
    GetSubscriptionHistoryQuery, GetSubscriptionQuery, ListPlansHandler, ListPlansQuery,
    ListProductsHandler, RenewSubscriptionCommand, RenewSubscriptionHandler,
    RenewSubscriptionResult, StopSubscriptionCommand, StopSubscriptionHandler,
    StopSubscriptionResult,
};
pub use webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandleGatewayWebhookResult,
    PurgeWebhookEventsHandler, PurgeWebhookEventsResult, WebhookSettings,
};
