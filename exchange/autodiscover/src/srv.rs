/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Locating an autodiscover host through DNS SRV records.

use async_trait::async_trait;
use rand::{seq::SliceRandom, Rng};
use tracing::debug;

use crate::AutodiscoverError;

/// The only port autodiscover SRV targets are accepted on.
pub const HTTPS_PORT: u16 = 443;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SrvRecord {
    pub target: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,
}

impl SrvRecord {
    pub fn new(target: impl Into<String>, port: u16, priority: u16, weight: u16) -> Self {
        Self {
            target: target.into(),
            port,
            priority,
            weight,
        }
    }
}

/// Looks up SRV records. DNS is left to the caller, who may back this with
/// whichever resolver they already use.
#[async_trait]
pub trait SrvResolver: Send + Sync {
    async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, AutodiscoverError>;
}

pub fn srv_query_name(domain: &str) -> String {
    format!("_autodiscover._tcp.{domain}")
}

/// Picks the record to contact among `records`.
///
/// Only records on port 443 are considered. The best one has the lowest
/// priority and, among those, the highest weight; every record sharing both
/// values with it is a candidate and one candidate is chosen at random.
pub fn select_srv_record<'a, R>(records: &'a [SrvRecord], rng: &mut R) -> Option<&'a SrvRecord>
where
    R: Rng + ?Sized,
{
    let https = || records.iter().filter(|record| record.port == HTTPS_PORT);

    let best_priority = https().map(|record| record.priority).min()?;
    let best_weight = https()
        .filter(|record| record.priority == best_priority)
        .map(|record| record.weight)
        .max()?;

    let candidates: Vec<&SrvRecord> = https()
        .filter(|record| record.priority == best_priority && record.weight == best_weight)
        .collect();

    candidates.choose(rng).copied()
}

/// Resolves the autodiscover SRV records for `domain` and returns the host
/// of the selected record, if any.
pub async fn find_srv_host<R>(
    resolver: &dyn SrvResolver,
    domain: &str,
    rng: &mut R,
) -> Result<Option<String>, AutodiscoverError>
where
    R: Rng + ?Sized,
{
    let name = srv_query_name(domain);
    let records = resolver.lookup_srv(&name).await?;
    debug!("{name} has {} SRV record(s)", records.len());

    Ok(select_srv_record(&records, rng).map(|record| record.target.trim_end_matches('.').to_string()))
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn query_name() {
        assert_eq!(srv_query_name("contoso.com"), "_autodiscover._tcp.contoso.com");
    }

    #[test]
    fn lowest_priority_then_highest_weight_wins() {
        let records = [
            SrvRecord::new("a.contoso.com", 443, 10, 5),
            SrvRecord::new("b.contoso.com", 443, 10, 1),
            SrvRecord::new("c.contoso.com", 443, 20, 0),
        ];

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected = select_srv_record(&records, &mut rng).unwrap();
            assert_eq!(selected.target, "a.contoso.com");
        }
    }

    #[test]
    fn other_ports_are_ignored() {
        let records = [
            SrvRecord::new("fast.contoso.com", 8443, 0, 100),
            SrvRecord::new("slow.contoso.com", 443, 50, 0),
        ];

        let mut rng = StdRng::seed_from_u64(7);
        let selected = select_srv_record(&records, &mut rng).unwrap();
        assert_eq!(selected.target, "slow.contoso.com");

        assert_eq!(select_srv_record(&records[..1], &mut rng), None);
        assert_eq!(select_srv_record(&[], &mut rng), None);
    }

    #[test]
    fn ties_are_broken_at_random() {
        let records = [
            SrvRecord::new("a.contoso.com", 443, 10, 5),
            SrvRecord::new("b.contoso.com", 443, 10, 5),
            SrvRecord::new("c.contoso.com", 443, 20, 5),
        ];

        let picks: Vec<&str> = (0..64)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                select_srv_record(&records, &mut rng).unwrap().target.as_str()
            })
            .collect();

        assert!(picks.contains(&"a.contoso.com"));
        assert!(picks.contains(&"b.contoso.com"));
        assert!(!picks.contains(&"c.contoso.com"));

        // The same seed always makes the same choice.
        let again = select_srv_record(&records, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(again.target, picks[3]);
    }

    struct StaticResolver(Vec<SrvRecord>);

    #[async_trait]
    impl SrvResolver for StaticResolver {
        async fn lookup_srv(&self, name: &str) -> Result<Vec<SrvRecord>, AutodiscoverError> {
            assert_eq!(name, "_autodiscover._tcp.contoso.com");
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn resolved_host_drops_the_trailing_dot() {
        let resolver = StaticResolver(vec![SrvRecord::new("mail.contoso.com.", 443, 0, 0)]);
        let mut rng = StdRng::seed_from_u64(0);

        let host = find_srv_host(&resolver, "contoso.com", &mut rng).await.unwrap();
        assert_eq!(host.as_deref(), Some("mail.contoso.com"));
    }
}
