use async_trait::async_trait;
use rand::Rng;
use votemute_application::{NetworkError, RandomSource};

/// In-process generator for offline runs.
#[derive(Debug, Default)]
pub struct LocalRandomSource;

#[async_trait]
impl RandomSource for LocalRandomSource {
    async fn request_random_int(&self, min: i64, max: i64) -> Result<i64, NetworkError> {
        if min > max {
            return Err(NetworkError::MalformedResponse(format!(
                "empty range {}..={}",
                min, max
            )));
        }
        Ok(rand::thread_rng().gen_range(min..=max))
    }
}
