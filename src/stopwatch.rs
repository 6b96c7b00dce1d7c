use std::time::Duration;

/// Elapsed round time split into display components.
///
/// Components are truncated, never rounded: 75.239s is `01:15:23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lap {
    pub minutes: u32,
    pub seconds: u32,
    pub hundredths: u32,
}

impl Lap {
    pub fn from_duration(elapsed: Duration) -> Self {
        let centis = elapsed.as_millis() / 10;
        Self::from_centiseconds(u32::try_from(centis).unwrap_or(u32::MAX))
    }

    pub fn from_centiseconds(centis: u32) -> Self {
        Self {
            minutes: centis / 6000,
            seconds: (centis / 100) % 60,
            hundredths: centis % 100,
        }
    }

    pub fn total_centiseconds(&self) -> u32 {
        self.minutes * 6000 + self.seconds * 100 + self.hundredths
    }

    /// `MM:SS:CC`, every field zero-padded to two digits
    pub fn label(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.minutes, self.seconds, self.hundredths
        )
    }

    /// Record key compared between rounds.
    ///
    /// Minutes weigh 1000, not 6000, so a minute rollover is not proportional. Changing this
    /// changes which rounds count as records.
    pub fn score(&self) -> u32 {
        self.minutes
            .saturating_mul(1000)
            .saturating_add(self.seconds * 100)
            .saturating_add(self.hundredths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_truncates() {
        let lap = Lap::from_duration(Duration::from_millis(75_239));
        assert_eq!(lap.minutes, 1);
        assert_eq!(lap.seconds, 15);
        assert_eq!(lap.hundredths, 23);
        assert_eq!(lap.label(), "01:15:23");
    }

    #[test]
    fn test_label_zero() {
        assert_eq!(Lap::default().label(), "00:00:00");
        assert_eq!(Lap::from_duration(Duration::from_millis(9)).label(), "00:00:00");
    }

    #[test]
    fn test_sub_second() {
        let lap = Lap::from_duration(Duration::from_millis(4_567));
        assert_eq!(lap.label(), "00:04:56");
        assert_eq!(lap.score(), 456);
    }

    #[test]
    fn test_seconds_roll_over_at_sixty() {
        let lap = Lap::from_duration(Duration::from_secs(60));
        assert_eq!(lap.label(), "01:00:00");
        let lap = Lap::from_duration(Duration::from_millis(59_990));
        assert_eq!(lap.label(), "00:59:99");
    }

    #[test]
    fn test_score_minute_weight_is_not_proportional() {
        // 59.99s scores higher than 1:00.00
        let under_minute = Lap::from_duration(Duration::from_millis(59_990));
        let one_minute = Lap::from_duration(Duration::from_secs(60));
        assert_eq!(under_minute.score(), 5999);
        assert_eq!(one_minute.score(), 1000);
        assert!(one_minute.score() < under_minute.score());
    }

    #[test]
    fn test_total_centiseconds_roundtrip() {
        let lap = Lap::from_centiseconds(7_523);
        assert_eq!(lap.total_centiseconds(), 7_523);
        assert_eq!(lap.label(), "01:15:23");
    }

    #[test]
    fn test_long_rounds_keep_counting_minutes() {
        let lap = Lap::from_duration(Duration::from_secs(125 * 60));
        assert_eq!(lap.label(), "125:00:00");
    }
}
