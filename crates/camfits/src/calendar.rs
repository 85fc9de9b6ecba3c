//! Calendar dates to Modified Julian Dates.
//!
//! The timestamp cards only need one conversion, so it is expressed as a small
//! trait that callers can back with their own astronomy library.

/// Julian Date of the MJD epoch used here (1899 December 31, 12h UT).
pub const MJD0: f64 = 2_415_020.0;

/// Converts a calendar date to days since [`MJD0`].
pub trait Calendar {
    /// `month` is 1-based, `day` may carry a fractional part, and negative
    /// years are BC.
    fn mjd(&self, month: u32, day: f64, year: i32) -> f64;
}

/// Proleptic Julian calendar before 1582 October 15, Gregorian afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gregorian;

impl Calendar for Gregorian {
    fn mjd(&self, month: u32, day: f64, year: i32) -> f64 {
        let mut m = month as i64;
        let mut y = if year < 0 { year as i64 + 1 } else { year as i64 };
        if month < 3 {
            m += 12;
            y -= 1;
        }

        let julian = year < 1582 || (year == 1582 && (month < 10 || (month == 10 && day < 15.0)));
        let b = if julian {
            0
        } else {
            let a = y / 100;
            2 - a + a / 4
        };

        let c = if y < 0 {
            (365.25 * y as f64 - 0.75) as i64 - 694_025
        } else {
            (365.25 * y as f64) as i64 - 694_025
        };
        let d = (30.6001 * (m + 1) as f64) as i64;

        (b + c + d) as f64 + day - 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jd(month: u32, day: f64, year: i32) -> f64 {
        Gregorian.mjd(month, day, year) + MJD0
    }

    #[test]
    fn j2000_epoch() {
        assert_eq!(jd(1, 1.5, 2000), 2_451_545.0);
    }

    #[test]
    fn mjd_epoch_is_zero() {
        assert_eq!(Gregorian.mjd(12, 31.5, 1899), 0.0);
    }

    #[test]
    fn unix_epoch() {
        assert_eq!(jd(1, 1.0, 1970), 2_440_587.5);
    }

    #[test]
    fn gregorian_switch() {
        // 1582 Oct 4 (Julian) is followed by Oct 15 (Gregorian).
        assert_eq!(jd(10, 15.0, 1582) - jd(10, 4.0, 1582), 1.0);
    }

    #[test]
    fn fractional_days() {
        let noon = jd(6, 15.5, 2024);
        let midnight = jd(6, 15.0, 2024);
        assert!((noon - midnight - 0.5).abs() < 1e-9);
    }
}
