use mouse_gesture::logging;

#[test]
fn init_is_idempotent() {
    logging::init(true);
    tracing::debug!("first");
    logging::init(false);
    tracing::info!("second");
}
