//! Per-IP rate limit configuration for the endpoints players can spam.
//!
//! - Joining a session: `RATE_LIMIT_JOINS_PER_MINUTE` per IP
//! - Submitting captions: `RATE_LIMIT_CAPTIONS_PER_MINUTE` per IP

use std::time::Duration;

use actix_extensible_rate_limit::backend::SimpleInputFunctionBuilder;

const WINDOW: Duration = Duration::from_secs(60);

pub fn join_rate_limit_config(per_minute: u64) -> SimpleInputFunctionBuilder {
    SimpleInputFunctionBuilder::new(WINDOW, per_minute).real_ip_key()
}

pub fn caption_rate_limit_config(per_minute: u64) -> SimpleInputFunctionBuilder {
    SimpleInputFunctionBuilder::new(WINDOW, per_minute).real_ip_key()
}
