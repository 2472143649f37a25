//! 사전 샘플링 -- N개 중 1개의 이벤트만 싱크로 보냅니다.
//!
//! 레코드의 `sample_rate`는 백엔드가 이벤트 하나를 N개로 환산하는
//! 가중치입니다. 실제로 1/N만 남겨야 환산된 총량이 원래 트래픽과 맞습니다.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 이벤트 단위 사전 샘플러
///
/// send 태스크가 소유하며, 이벤트마다 [`Sampler::keep`]을 한 번 호출합니다.
#[derive(Debug)]
pub struct Sampler {
    rate: u32,
    rng: StdRng,
}

impl Sampler {
    /// 스레드 RNG로 시드한 샘플러를 생성합니다. 0은 1로 취급합니다.
    pub fn new(rate: u32) -> Self {
        Self {
            rate: rate.max(1),
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// 고정 시드 샘플러를 생성합니다. 같은 시드는 같은 선택을 반복합니다.
    pub fn with_seed(rate: u32, seed: u64) -> Self {
        Self {
            rate: rate.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 샘플링 비율
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// 이번 이벤트를 남길지 결정합니다. 비율이 1이면 항상 남깁니다.
    pub fn keep(&mut self) -> bool {
        self.rate == 1 || self.rng.random_ratio(1, self.rate)
    }
}
