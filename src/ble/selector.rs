//! Candidate selection - picks the one heart-rate strap to connect to.
//!
//! Every advertisement seen during a scan is scored into a [`Tier`]:
//!
//! | Tier        | Rule                                                  |
//! |-------------|-------------------------------------------------------|
//! | `Preferred` | name equals the configured preferred name (no case)   |
//! | `Service`   | advertises the Heart Rate Service (0x180D)            |
//! | `NameHint`  | name contains one of the configured hints (no case)   |
//! | `None`      | ignored                                               |
//!
//! A higher tier always wins; within a tier the stronger RSSI wins and
//! ties keep the incumbent.  A `Preferred` hit is authoritative and ends
//! the scan.

use crate::ble::{Address, Advertisement, DeviceName};
use crate::config::LinkConfig;

/// Priority rank of a candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tier {
    #[default]
    None = 0,
    NameHint = 1,
    Service = 2,
    Preferred = 3,
}

/// An advertisement considered as a connection target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Candidate {
    pub address: Address,
    pub name: Option<DeviceName>,
    /// Received Signal Strength Indicator (dBm).
    pub rssi: i8,
    pub tier: Tier,
}

/// What an observed advertisement did to the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// Tier 0; the selection was not touched.
    Ignored,
    /// Scored, but the current selection is at least as good.
    Kept,
    /// Became the new selection.
    Selected,
    /// Became the new selection and is a preferred-name match; stop the scan.
    Authoritative,
}

/// Holds the single best candidate of the current scan.
#[derive(Debug)]
pub struct CandidateSelector {
    preferred_name: Option<&'static str>,
    name_hints: &'static [&'static str],
    selected: Option<Candidate>,
}

impl CandidateSelector {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            preferred_name: config.preferred_name,
            name_hints: config.name_hints,
            selected: None,
        }
    }

    /// Score an advertisement against the configured names.
    pub fn score(&self, adv: &Advertisement) -> Tier {
        let name = adv.name.as_deref();

        if let (Some(name), Some(preferred)) = (name, self.preferred_name) {
            if name.eq_ignore_ascii_case(preferred) {
                return Tier::Preferred;
            }
        }

        if adv.advertises_heart_rate() {
            return Tier::Service;
        }

        match name {
            Some(name) if self.name_hints.iter().any(|h| contains_ignore_case(name, h)) => {
                Tier::NameHint
            }
            _ => Tier::None,
        }
    }

    /// Feed one advertisement; replaces the selection if it ranks higher.
    pub fn observe(&mut self, adv: &Advertisement) -> Verdict {
        let tier = self.score(adv);
        if tier == Tier::None {
            return Verdict::Ignored;
        }

        let replace = match &self.selected {
            None => true,
            Some(cur) => tier > cur.tier || (tier == cur.tier && adv.rssi > cur.rssi),
        };
        if !replace {
            return Verdict::Kept;
        }

        debug!("Selected {} (tier {}, RSSI {})", adv.name, tier, adv.rssi);
        self.selected = Some(Candidate {
            address: adv.address,
            name: adv.name.clone(),
            rssi: adv.rssi,
            tier,
        });

        if tier == Tier::Preferred {
            Verdict::Authoritative
        } else {
            Verdict::Selected
        }
    }

    /// Current selection, if any.
    pub fn selected(&self) -> Option<&Candidate> {
        self.selected.as_ref()
    }

    /// Tier of the current selection (`Tier::None` when empty).
    pub fn best_tier(&self) -> Tier {
        self.selected.as_ref().map_or(Tier::None, |c| c.tier)
    }

    /// Hand the selection over (consumed by a successful connection).
    pub fn take(&mut self) -> Option<Candidate> {
        self.selected.take()
    }

    /// Forget the selection; called at the start of every scan.
    pub fn reset(&mut self) {
        self.selected = None;
    }
}

/// ASCII case-insensitive substring test; an empty needle never matches.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let (h, n) = (haystack.as_bytes(), needle.as_bytes());
    if n.is_empty() || n.len() > h.len() {
        return false;
    }
    h.windows(n.len()).any(|w| w.eq_ignore_ascii_case(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HR_SERVICE_UUID;

    const HINTS: &[&str] = &["polar", "hrm"];

    fn selector() -> CandidateSelector {
        CandidateSelector::new(
            &LinkConfig::new()
                .preferred_name("My Strap")
                .name_hints(HINTS),
        )
    }

    fn adv(id: u8, name: Option<&str>, hr_service: bool, rssi: i8) -> Advertisement {
        let services: &[u16] = if hr_service { &[HR_SERVICE_UUID] } else { &[] };
        Advertisement::new(Address([id; 6]), name, services, rssi)
    }

    #[test]
    fn scoring_tiers() {
        let s = selector();
        assert_eq!(s.score(&adv(1, Some("my strap"), false, -80)), Tier::Preferred);
        assert_eq!(s.score(&adv(1, Some("MY STRAP"), true, -80)), Tier::Preferred);
        assert_eq!(s.score(&adv(2, Some("Polar H9"), true, -80)), Tier::Service);
        assert_eq!(s.score(&adv(3, None, true, -80)), Tier::Service);
        assert_eq!(s.score(&adv(4, Some("POLAR OH1"), false, -80)), Tier::NameHint);
        assert_eq!(s.score(&adv(5, Some("xHRMx"), false, -80)), Tier::NameHint);
        assert_eq!(s.score(&adv(6, Some("Headphones"), false, -30)), Tier::None);
        assert_eq!(s.score(&adv(7, None, false, -30)), Tier::None);
    }

    #[test]
    fn preferred_name_needs_exact_match() {
        let s = selector();
        assert_eq!(s.score(&adv(1, Some("My Strap 2"), false, -40)), Tier::None);
    }

    #[test]
    fn no_preferred_name_configured() {
        let s = CandidateSelector::new(&LinkConfig::new().name_hints(HINTS));
        assert_eq!(s.score(&adv(1, Some("My Strap"), false, -40)), Tier::None);
    }

    #[test]
    fn tier_dominates_rssi() {
        let mut s = selector();
        assert_eq!(s.observe(&adv(1, None, true, -60)), Verdict::Selected);
        assert_eq!(s.observe(&adv(2, Some("Polar"), false, -30)), Verdict::Kept);
        let sel = s.selected().unwrap();
        assert_eq!(sel.address, Address([1; 6]));
        assert_eq!(sel.tier, Tier::Service);
    }

    #[test]
    fn equal_tier_stronger_rssi_replaces() {
        let mut s = selector();
        s.observe(&adv(1, None, true, -70));
        assert_eq!(s.observe(&adv(2, None, true, -50)), Verdict::Selected);
        assert_eq!(s.selected().unwrap().address, Address([2; 6]));
        assert_eq!(s.selected().unwrap().rssi, -50);
    }

    #[test]
    fn equal_tier_equal_or_weaker_rssi_keeps_incumbent() {
        let mut s = selector();
        s.observe(&adv(1, None, true, -50));
        assert_eq!(s.observe(&adv(2, None, true, -50)), Verdict::Kept);
        assert_eq!(s.observe(&adv(3, None, true, -90)), Verdict::Kept);
        assert_eq!(s.selected().unwrap().address, Address([1; 6]));
    }

    #[test]
    fn higher_tier_replaces_despite_weaker_rssi() {
        let mut s = selector();
        s.observe(&adv(1, Some("hrm"), false, -30));
        assert_eq!(s.best_tier(), Tier::NameHint);
        assert_eq!(s.observe(&adv(2, None, true, -95)), Verdict::Selected);
        assert_eq!(s.best_tier(), Tier::Service);
    }

    #[test]
    fn preferred_is_authoritative_over_any_selection() {
        let mut s = selector();
        s.observe(&adv(1, None, true, -20));
        assert_eq!(
            s.observe(&adv(9, Some("My Strap"), false, -99)),
            Verdict::Authoritative
        );
        assert_eq!(s.selected().unwrap().tier, Tier::Preferred);
    }

    #[test]
    fn ignored_advertisement_leaves_selection() {
        let mut s = selector();
        s.observe(&adv(1, None, true, -70));
        assert_eq!(s.observe(&adv(2, Some("Speaker"), false, -10)), Verdict::Ignored);
        assert_eq!(s.selected().unwrap().address, Address([1; 6]));
    }

    #[test]
    fn reset_and_take_clear_selection() {
        let mut s = selector();
        s.observe(&adv(1, None, true, -70));
        s.reset();
        assert!(s.selected().is_none());
        assert_eq!(s.best_tier(), Tier::None);

        s.observe(&adv(2, None, true, -70));
        let taken = s.take().unwrap();
        assert_eq!(taken.address, Address([2; 6]));
        assert!(s.selected().is_none());
    }

    #[test]
    fn case_insensitive_contains() {
        assert!(contains_ignore_case("Wahoo TICKR", "tickr"));
        assert!(!contains_ignore_case("abc", "abcd"));
        assert!(!contains_ignore_case("abc", ""));
    }
}
