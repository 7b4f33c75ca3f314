use rent_payments::backend::mock::MockBackend;
use rent_payments::domain::due::DuePayment;
use rent_payments::service::due_refresher::DueRefresher;
use rent_payments::service::notifier::{Notice, NoticeLog, Notifier};
use rust_decimal::Decimal;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn failed_refresh_keeps_previous_due() {
    let backend = Arc::new(MockBackend::with_due(due()));
    let notices = NoticeLog::new();
    let notifier: Arc<dyn Notifier> = Arc::new(notices.clone());
    let refresher = DueRefresher::new(backend.clone(), notifier);

    let first = refresher.refresh().await.unwrap();
    assert!(first.has_due);

    backend.fail_due_loads.store(true, Ordering::SeqCst);
    assert!(refresher.refresh().await.is_err());
    assert_eq!(refresher.current().await, Some(first));
    assert!(notices
        .drain()
        .iter()
        .any(|n| matches!(n, Notice::DueLoadFailed { .. })));

    backend.fail_due_loads.store(false, Ordering::SeqCst);
    backend.settle();
    let after = refresher.refresh().await.unwrap();
    assert!(!after.has_due);
    assert_eq!(after.payable_id(), None);
}

#[tokio::test]
async fn current_or_load_fetches_once() {
    let backend = Arc::new(MockBackend::with_due(due()));
    let notifier: Arc<dyn Notifier> = Arc::new(NoticeLog::new());
    let refresher = DueRefresher::new(backend.clone(), notifier);

    assert!(refresher.last_loaded_at().await.is_none());
    refresher.current_or_load().await.unwrap();
    refresher.current_or_load().await.unwrap();
    assert_eq!(backend.due_count(), 1);
    assert!(refresher.last_loaded_at().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn scheduled_refresh_fires_after_delay() {
    let backend = Arc::new(MockBackend::with_due(due()));
    let notifier: Arc<dyn Notifier> = Arc::new(NoticeLog::new());
    let refresher = DueRefresher::new(backend.clone(), notifier);

    let handle = refresher.schedule(Duration::from_secs(5));
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(backend.due_count(), 0);

    handle.await.unwrap();
    assert_eq!(backend.due_count(), 1);
    assert!(refresher.current().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_refresh_does_not_overwrite_newer_due() {
    let backend = Arc::new(MockBackend::with_due(due()));
    let notifier: Arc<dyn Notifier> = Arc::new(NoticeLog::new());
    let refresher = DueRefresher::new(backend.clone(), notifier);

    *backend.due_latency.lock() = Some(Duration::from_secs(3));
    let slow = {
        let refresher = refresher.clone();
        tokio::spawn(async move { refresher.refresh().await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.due_count(), 1);

    *backend.due_latency.lock() = None;
    backend.settle();
    let fresh = refresher.refresh().await.unwrap();
    assert!(!fresh.has_due);

    let late = slow.await.unwrap().unwrap();
    assert!(!late.has_due);
    let shown = refresher.current().await.unwrap();
    assert!(!shown.has_due);
    assert_eq!(shown.payable_id(), None);
}

fn due() -> DuePayment {
    DuePayment {
        payment_id: Some("pay_7".to_string()),
        has_due: true,
        base_amount: Decimal::from(8000),
        late_fee_amount: Decimal::from(200),
        total_amount: Decimal::from(8200),
        period_month: Some(1),
        period_year: Some(2026),
        is_overdue: true,
        grace_period_ends: None,
    }
}
