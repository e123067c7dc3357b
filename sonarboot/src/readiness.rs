//! Server readiness polling.
//!
//! After the restart is triggered, the server drops connections and cycles
//! through transitional states before reporting `UP`. The poll loop treats
//! every probe error the same as a transitional status and retries at a
//! fixed cadence, with no upper bound - if the server never becomes
//! healthy, the loop runs until the process is killed externally.
//!
//! Probe and sleep are injected so tests can script status sequences and
//! count delays without real time passing.

use log::{debug, info};
use std::future::Future;

use sonarqube_platform::{ServerStatus, SonarError};

/// Poll until a probe reports the server `UP`.
///
/// Returns the number of probes issued; the number of sleeps is always one
/// less than that.
pub async fn wait_until_up<P, PFut, S, SFut>(mut probe: P, mut sleep: S) -> u32
where
    P: FnMut() -> PFut,
    PFut: Future<Output = Result<ServerStatus, SonarError>>,
    S: FnMut() -> SFut,
    SFut: Future<Output = ()>,
{
    let mut probes: u32 = 0;

    loop {
        probes = probes.saturating_add(1);
        match probe().await {
            Ok(status) if status.is_up() => {
                info!("Sonar is ready");
                return probes;
            }
            Ok(status) => {
                debug!("Sonar is not alive yet (status {status}), waiting...");
            }
            Err(err) => {
                debug!("Sonar is not alive yet ({err}), waiting...");
            }
        }
        sleep().await;
    }
}
