mod acknowledgment;
mod idempotence;
mod zero_watchers;
