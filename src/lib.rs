pub mod backend;
pub mod config;
pub mod domain {
    pub mod due;
    pub mod payment;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod due;
        pub mod ops;
        pub mod payments;
    }
}
pub mod presentation;
pub mod reconcile;
pub mod service {
    pub mod due_refresher;
    pub mod notifier;
    pub mod payment_flow;
}

#[derive(Clone)]
pub struct AppState {
    pub flow: service::payment_flow::PaymentFlow,
    pub hosted_checkout: std::sync::Arc<gateways::hosted::HostedCheckout>,
    pub notices: service::notifier::NoticeLog,
}
