use super::*;

#[tokio::test]
async fn cancelled_resolves_for_every_clone() {
    let token = CancelToken::new();
    let other = token.clone();
    assert!(!other.is_cancelled());

    let waiter = async {
        other.cancelled().await;
        other.is_cancelled()
    };
    let trigger = async {
        tokio::task::yield_now().await;
        token.cancel();
    };
    let (seen, ()) = tokio::join!(waiter, trigger);
    assert!(seen);
}

#[tokio::test]
async fn cancelled_is_immediate_after_cancel() {
    let token = CancelToken::default();
    token.cancel();
    token.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(1), token.cancelled())
        .await
        .unwrap();
}
