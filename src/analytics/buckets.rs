use chrono::{Datelike, NaiveDate};

use crate::config::price_bands::{BUDGET_MAX, LOW_MAX, PREMIUM_MAX, STANDARD_MAX};

// ---------------------------------------------------------------------------
// Price bands
// ---------------------------------------------------------------------------

/// Non-overlapping ticket price bands, evaluated in ascending order.
/// A price lands in the first band whose upper bound it does not exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    /// price <= €10
    UpTo10,
    /// €10 < price <= €25
    To25,
    /// €25 < price <= €50
    To50,
    /// €50 < price <= €100
    To100,
    /// price > €100
    Over100,
}

impl PriceBand {
    pub const ALL: [PriceBand; 5] = [
        PriceBand::UpTo10,
        PriceBand::To25,
        PriceBand::To50,
        PriceBand::To100,
        PriceBand::Over100,
    ];

    pub fn from_price(price: f64) -> Self {
        if price <= LOW_MAX {
            PriceBand::UpTo10
        } else if price <= BUDGET_MAX {
            PriceBand::To25
        } else if price <= STANDARD_MAX {
            PriceBand::To50
        } else if price <= PREMIUM_MAX {
            PriceBand::To100
        } else {
            PriceBand::Over100
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceBand::UpTo10 => "0-10",
            PriceBand::To25 => "10-25",
            PriceBand::To50 => "25-50",
            PriceBand::To100 => "50-100",
            PriceBand::Over100 => "100+",
        }
    }
}

// ---------------------------------------------------------------------------
// Age bands
// ---------------------------------------------------------------------------

/// Buyer age bands. There is no band below 18 — younger (or unresolvable)
/// clients are excluded from the age distribution entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    A18To24,
    A25To34,
    A35To44,
    A45To54,
    A55Plus,
}

impl AgeBand {
    pub const ALL: [AgeBand; 5] = [
        AgeBand::A18To24,
        AgeBand::A25To34,
        AgeBand::A35To44,
        AgeBand::A45To54,
        AgeBand::A55Plus,
    ];

    pub fn from_age(age: u32) -> Option<Self> {
        match age {
            0..=17 => None,
            18..=24 => Some(AgeBand::A18To24),
            25..=34 => Some(AgeBand::A25To34),
            35..=44 => Some(AgeBand::A35To44),
            45..=54 => Some(AgeBand::A45To54),
            _ => Some(AgeBand::A55Plus),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBand::A18To24 => "18-24",
            AgeBand::A25To34 => "25-34",
            AgeBand::A35To44 => "35-44",
            AgeBand::A45To54 => "45-54",
            AgeBand::A55Plus => "55+",
        }
    }
}

/// Whole years between `birthdate` and `today`, minus one if the birthday
/// has not yet occurred this year. Returns None for birthdates in the future.
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn price_band_boundaries_are_inclusive() {
        assert_eq!(PriceBand::from_price(10.0), PriceBand::UpTo10);
        assert_eq!(PriceBand::from_price(10.01), PriceBand::To25);
        assert_eq!(PriceBand::from_price(25.0), PriceBand::To25);
        assert_eq!(PriceBand::from_price(50.0), PriceBand::To50);
        assert_eq!(PriceBand::from_price(100.0), PriceBand::To100);
        assert_eq!(PriceBand::from_price(100.01), PriceBand::Over100);
    }

    #[test]
    fn zero_and_negative_prices_fall_in_first_band() {
        assert_eq!(PriceBand::from_price(0.0), PriceBand::UpTo10);
        assert_eq!(PriceBand::from_price(-1.0), PriceBand::UpTo10);
    }

    #[test]
    fn age_on_exact_birthday() {
        let birth = date(2008, 6, 15);
        assert_eq!(age_on(birth, date(2026, 6, 15)), Some(18));
    }

    #[test]
    fn age_on_day_before_birthday() {
        let birth = date(2008, 6, 15);
        assert_eq!(age_on(birth, date(2026, 6, 14)), Some(17));
    }

    #[test]
    fn age_on_future_birthdate_is_none() {
        let birth = date(2030, 1, 1);
        assert_eq!(age_on(birth, date(2026, 6, 15)), None);
    }

    #[test]
    fn exactly_eighteen_lands_in_first_band() {
        assert_eq!(AgeBand::from_age(18), Some(AgeBand::A18To24));
    }

    #[test]
    fn seventeen_is_excluded_from_all_bands() {
        assert_eq!(AgeBand::from_age(17), None);
    }

    #[test]
    fn age_band_edges() {
        assert_eq!(AgeBand::from_age(24), Some(AgeBand::A18To24));
        assert_eq!(AgeBand::from_age(25), Some(AgeBand::A25To34));
        assert_eq!(AgeBand::from_age(34), Some(AgeBand::A25To34));
        assert_eq!(AgeBand::from_age(35), Some(AgeBand::A35To44));
        assert_eq!(AgeBand::from_age(54), Some(AgeBand::A45To54));
        assert_eq!(AgeBand::from_age(55), Some(AgeBand::A55Plus));
        assert_eq!(AgeBand::from_age(90), Some(AgeBand::A55Plus));
    }
}
