use foundation::CalendarDate;

/// Where a running animation is: `index` of `total`, showing `date`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameProgress {
    /// 0-based frame index.
    pub index: usize,
    pub total: usize,
    pub date: CalendarDate,
}

impl FrameProgress {
    /// 1-based position for display.
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }
}

#[cfg(test)]
mod tests {
    use super::FrameProgress;
    use foundation::CalendarDate;

    #[test]
    fn ordinal_is_one_based() {
        let p = FrameProgress {
            index: 29,
            total: 30,
            date: CalendarDate::from_ymd(2024, 1, 1).unwrap(),
        };
        assert_eq!(p.ordinal(), 30);
    }
}
