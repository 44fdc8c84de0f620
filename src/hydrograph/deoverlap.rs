/// Basis-time de-overlap engine.
///
/// A river forecast point accumulates several forecast runs, each tagged
/// with the basis (issuance) time of the model run that produced it.
/// Their valid-time spans overlap: a run issued this morning covers much
/// of the same window as the run issued last night. To assemble one
/// contiguous "virtual" forecast series, each run's span is clipped
/// against the spans of all more recently issued runs, so that every
/// valid time is covered by exactly one run and the newest data always
/// wins where runs overlap.
///
/// This module is a pure function over (basis time, start, end) spans.
/// It performs no I/O and knows nothing about stations or readings;
/// `hydrograph::mod` applies its output to the raw forecast rows.

use chrono::{DateTime, Duration, Utc};

/// Valid-time span of one forecast run, prior to adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisSpan {
    /// Issuance time of the run. Higher wins where spans overlap.
    pub basis_time: DateTime<Utc>,
    /// Earliest valid time among the run's rows.
    pub start: DateTime<Utc>,
    /// Latest valid time among the run's rows.
    pub end: DateTime<Utc>,
}

/// Inclusive valid-time window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// One forecast run's span after adjustment. `window` is `None` when the
/// run was entirely shadowed by more recently issued runs and contributes
/// nothing to the assembled series.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedSpan {
    pub basis_time: DateTime<Utc>,
    pub window: Option<TimeWindow>,
}

/// Separation inserted between adjacent adjusted spans, so that a clipped
/// run resumes one minute after (or ends one minute before) the span that
/// shadowed it.
fn boundary_gap() -> Duration {
    Duration::minutes(1)
}

/// Clips each run's span against the growing assembled window.
///
/// Runs are processed newest basis time first (ties: earlier start time
/// first). The newest run seeds the assembled window unchanged; every
/// later-processed (older) run keeps only the portion of its span that
/// falls outside the window assembled so far:
///
/// - fully inside the assembled window → discarded;
/// - extends past both ends → only the portion before is kept, so the
///   assembled series stays contiguous;
/// - extends before → the before portion is kept, window start moves back;
/// - extends after → the after portion is kept, window end moves forward.
///
/// Returned spans are in processing order (newest basis first). Their
/// windows are pairwise non-overlapping and jointly cover the original
/// overall range, with adjacent windows one minute apart.
pub fn deoverlap_spans(spans: &[BasisSpan]) -> Vec<AdjustedSpan> {
    let mut ordered = spans.to_vec();
    ordered.sort_by(|a, b| b.basis_time.cmp(&a.basis_time).then(a.start.cmp(&b.start)));

    let mut adjusted: Vec<AdjustedSpan> = Vec::with_capacity(ordered.len());
    let Some(newest) = ordered.first() else {
        return adjusted;
    };

    let mut assembled = TimeWindow {
        start: newest.start,
        end: newest.end,
    };
    adjusted.push(AdjustedSpan {
        basis_time: newest.basis_time,
        window: Some(assembled),
    });

    for span in &ordered[1..] {
        let window = if span.start >= assembled.start && span.end <= assembled.end {
            // Fully shadowed by newer runs.
            None
        } else if span.start < assembled.start && span.end > assembled.end {
            // Extends past both ends. Keeping both remainders would leave
            // a hole where the assembled window sits, so only the before
            // portion survives.
            let window = clamp_window(span.start, assembled.start - boundary_gap());
            assembled.start = span.start;
            window
        } else if span.start < assembled.start {
            let end = if span.end >= assembled.start {
                assembled.start - boundary_gap()
            } else {
                span.end
            };
            let window = clamp_window(span.start, end);
            assembled.start = span.start;
            window
        } else {
            // span.end > assembled.end
            let start = if span.start <= assembled.end {
                assembled.end + boundary_gap()
            } else {
                span.start
            };
            let window = clamp_window(start, span.end);
            assembled.end = span.end;
            window
        };

        adjusted.push(AdjustedSpan {
            basis_time: span.basis_time,
            window,
        });
    }

    adjusted
}

/// A remainder shorter than the boundary gap collapses to nothing.
fn clamp_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<TimeWindow> {
    if start <= end {
        Some(TimeWindow { start, end })
    } else {
        None
    }
}

/// Retention predicate for raw forecast rows: a row survives the merge iff
/// some adjusted span for its basis time has a window containing its valid
/// time (inclusive bounds).
pub fn retains(adjusted: &[AdjustedSpan], basis_time: DateTime<Utc>, valid_time: DateTime<Utc>) -> bool {
    adjusted.iter().any(|span| {
        span.basis_time == basis_time
            && span.window.is_some_and(|w| w.contains(valid_time))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    fn span(basis: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> BasisSpan {
        BasisSpan {
            basis_time: basis,
            start,
            end,
        }
    }

    #[test]
    fn test_newer_run_shadows_overlap_older_run_clipped_after() {
        // Series A issued 10:00 spanning [10:00, 16:00]; series B issued
        // 12:00 spanning [09:00, 13:00]. B is newer and keeps its span;
        // A straddles B's end and resumes one minute later.
        let spans = vec![
            span(at(10, 0), at(10, 0), at(16, 0)),
            span(at(12, 0), at(9, 0), at(13, 0)),
        ];
        let adjusted = deoverlap_spans(&spans);

        assert_eq!(adjusted.len(), 2);
        assert_eq!(adjusted[0].basis_time, at(12, 0));
        assert_eq!(
            adjusted[0].window,
            Some(TimeWindow {
                start: at(9, 0),
                end: at(13, 0)
            })
        );
        assert_eq!(adjusted[1].basis_time, at(10, 0));
        assert_eq!(
            adjusted[1].window,
            Some(TimeWindow {
                start: at(13, 1),
                end: at(16, 0)
            })
        );
    }

    #[test]
    fn test_older_run_extending_before_is_clipped_before() {
        let spans = vec![
            span(at(6, 0), at(7, 0), at(13, 0)),
            span(at(12, 0), at(11, 0), at(16, 0)),
        ];
        let adjusted = deoverlap_spans(&spans);

        // Newest keeps [11:00, 16:00]; older run keeps [7:00, 10:59].
        assert_eq!(
            adjusted[1].window,
            Some(TimeWindow {
                start: at(7, 0),
                end: at(10, 59)
            })
        );
    }

    #[test]
    fn test_fully_contained_run_is_discarded() {
        let spans = vec![
            span(at(6, 0), at(11, 0), at(14, 0)),
            span(at(12, 0), at(10, 0), at(16, 0)),
        ];
        let adjusted = deoverlap_spans(&spans);
        assert_eq!(adjusted[1].window, None, "shadowed run contributes nothing");
    }

    #[test]
    fn test_run_straddling_both_ends_keeps_only_before_portion() {
        let spans = vec![
            span(at(6, 0), at(8, 0), at(18, 0)),
            span(at(12, 0), at(10, 0), at(14, 0)),
        ];
        let adjusted = deoverlap_spans(&spans);

        // Keeping both remainders would leave the series non-contiguous.
        assert_eq!(
            adjusted[1].window,
            Some(TimeWindow {
                start: at(8, 0),
                end: at(9, 59)
            })
        );
    }

    #[test]
    fn test_single_span_is_returned_unchanged() {
        let spans = vec![span(at(12, 0), at(9, 0), at(13, 0))];
        let adjusted = deoverlap_spans(&spans);
        assert_eq!(adjusted.len(), 1);
        assert_eq!(
            adjusted[0].window,
            Some(TimeWindow {
                start: at(9, 0),
                end: at(13, 0)
            })
        );
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(deoverlap_spans(&[]).is_empty());
    }

    #[test]
    fn test_latest_basis_span_is_never_modified() {
        let spans = vec![
            span(at(12, 0), at(10, 0), at(15, 0)),
            span(at(11, 0), at(8, 0), at(16, 0)),
            span(at(10, 0), at(7, 0), at(18, 0)),
        ];
        let adjusted = deoverlap_spans(&spans);
        assert_eq!(
            adjusted[0].window,
            Some(TimeWindow {
                start: at(10, 0),
                end: at(15, 0)
            })
        );
    }

    #[test]
    fn test_equal_basis_times_ordered_by_earlier_start() {
        let spans = vec![
            span(at(12, 0), at(11, 0), at(14, 0)),
            span(at(12, 0), at(9, 0), at(13, 0)),
        ];
        let adjusted = deoverlap_spans(&spans);

        // Earlier start wins position and seeds the assembled window.
        assert_eq!(adjusted[0].basis_time, at(12, 0));
        assert_eq!(
            adjusted[0].window,
            Some(TimeWindow {
                start: at(9, 0),
                end: at(13, 0)
            })
        );
        // The later-starting sibling is clipped to the after portion.
        assert_eq!(
            adjusted[1].window,
            Some(TimeWindow {
                start: at(13, 1),
                end: at(14, 0)
            })
        );
    }

    #[test]
    fn test_windows_are_pairwise_non_overlapping_and_cover_the_range() {
        let spans = vec![
            span(at(12, 0), at(10, 0), at(15, 0)),
            span(at(11, 0), at(8, 0), at(12, 0)),
            span(at(10, 0), at(6, 0), at(9, 0)),
            span(at(9, 0), at(5, 0), at(14, 0)),
        ];
        let adjusted = deoverlap_spans(&spans);
        let windows: Vec<TimeWindow> = adjusted.iter().filter_map(|s| s.window).collect();

        for (i, a) in windows.iter().enumerate() {
            for b in windows.iter().skip(i + 1) {
                assert!(
                    a.end < b.start || b.end < a.start,
                    "windows {:?} and {:?} overlap",
                    a,
                    b
                );
            }
        }

        let overall_start = windows.iter().map(|w| w.start).min().unwrap();
        let overall_end = windows.iter().map(|w| w.end).max().unwrap();
        assert_eq!(overall_start, at(5, 0), "earliest original start preserved");
        assert_eq!(overall_end, at(15, 0), "latest original end preserved");
    }

    #[test]
    fn test_sub_minute_remainder_collapses_to_nothing() {
        // The older run extends the assembled window by less than the
        // one-minute boundary gap; no usable remainder exists.
        let spans = vec![
            span(at(12, 0), at(9, 0), at(13, 0)),
            span(
                at(11, 0),
                at(10, 0),
                Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 30).unwrap(),
            ),
        ];
        let adjusted = deoverlap_spans(&spans);
        assert_eq!(adjusted[1].window, None);
    }

    #[test]
    fn test_retains_requires_matching_basis_and_inclusive_window() {
        let spans = vec![
            span(at(10, 0), at(10, 0), at(16, 0)),
            span(at(12, 0), at(9, 0), at(13, 0)),
        ];
        let adjusted = deoverlap_spans(&spans);

        // Inclusive at both window edges.
        assert!(retains(&adjusted, at(12, 0), at(9, 0)));
        assert!(retains(&adjusted, at(12, 0), at(13, 0)));
        assert!(retains(&adjusted, at(10, 0), at(13, 1)));
        assert!(retains(&adjusted, at(10, 0), at(16, 0)));

        // The overlap now belongs to the newer run only.
        assert!(!retains(&adjusted, at(10, 0), at(12, 0)));

        // Unknown basis time matches nothing.
        assert!(!retains(&adjusted, at(8, 0), at(12, 0)));
    }
}
