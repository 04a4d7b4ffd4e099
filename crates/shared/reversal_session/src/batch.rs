#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::responder::Responder;
use crate::session::{Session, SessionConfig, SessionError, SessionSummary};

/// Run independent sessions, one environment and one pair of streams each.
///
/// `make_responder` receives the session index. Results keep input order.
#[cfg(feature = "parallel")]
pub fn run_batch<R, F>(
    configs: &[SessionConfig],
    make_responder: F,
) -> Vec<Result<SessionSummary, SessionError>>
where
    R: Responder,
    F: Fn(usize) -> R + Sync,
{
    configs
        .par_iter()
        .enumerate()
        .map(|(i, cfg)| run_one(cfg, make_responder(i)))
        .collect()
}

/// Run independent sessions, one environment and one pair of streams each.
///
/// `make_responder` receives the session index. Results keep input order.
#[cfg(not(feature = "parallel"))]
pub fn run_batch<R, F>(
    configs: &[SessionConfig],
    make_responder: F,
) -> Vec<Result<SessionSummary, SessionError>>
where
    R: Responder,
    F: Fn(usize) -> R + Sync,
{
    configs
        .iter()
        .enumerate()
        .map(|(i, cfg)| run_one(cfg, make_responder(i)))
        .collect()
}

/// `count` copies of `base` with every seed offset by the session index,
/// including the construction seed when one is set.
pub fn seeded_configs(base: &SessionConfig, count: usize) -> Vec<SessionConfig> {
    (0..count)
        .map(|i| {
            let offset = i as i64;
            let mut cfg = base.clone().with_seeds(
                base.env_seed.wrapping_add(offset),
                base.order_seed.wrapping_add(offset),
            );
            cfg.env.seed = base.env.seed.map(|s| s.wrapping_add(i as u64));
            cfg
        })
        .collect()
}

fn run_one<R: Responder>(
    cfg: &SessionConfig,
    mut responder: R,
) -> Result<SessionSummary, SessionError> {
    Session::new(cfg.clone()).run(&mut responder, |_| Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::WinStayLoseShift;
    use reversal::env::EnvConfig;

    fn base() -> SessionConfig {
        SessionConfig {
            env: EnvConfig::default().with_seed(5),
            num_trials: 80,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn seeds_are_offset_per_session() {
        let cfgs = seeded_configs(&base(), 3);
        assert_eq!(
            cfgs.iter().map(|c| (c.env_seed, c.order_seed)).collect::<Vec<_>>(),
            vec![(43, 54), (44, 55), (45, 56)]
        );
        assert_eq!(
            cfgs.iter().map(|c| c.env.seed).collect::<Vec<_>>(),
            vec![Some(5), Some(6), Some(7)]
        );

        let unseeded = seeded_configs(&SessionConfig::default(), 2);
        assert!(unseeded.iter().all(|c| c.env.seed.is_none()));
    }

    #[test]
    fn batch_matches_sequential_runs() {
        let cfgs = seeded_configs(&base(), 6);
        let batch = run_batch(&cfgs, |_| WinStayLoseShift::new(0));
        assert_eq!(batch.len(), 6);

        for (cfg, result) in cfgs.iter().zip(batch) {
            let got = result.unwrap();
            let want = Session::new(cfg.clone())
                .run(&mut WinStayLoseShift::new(0), |_| Ok(()))
                .unwrap();
            assert_eq!(got.trials_run, 80);
            assert_eq!(got.cumulative_reward, want.cumulative_reward);
            assert_eq!(got.reversals, want.reversals);
            assert_eq!(got.stats.reversal_trials, want.stats.reversal_trials);
        }
    }
}
