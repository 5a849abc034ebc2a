//! Bounded-viewport text fitting.
//!
//! Given transcript text that only ever grows and a fixed display budget,
//! find the longest trailing suffix whose rendered height fits the budget.
//! The only source of truth about layout is an injected [`Measure`] oracle,
//! which is expensive (a full markdown render per call), so the search is a
//! binary search over start offsets: O(log n) oracle calls per fit.
//!
//! The search relies on measurement being non-increasing as the start offset
//! grows (dropping a prefix never makes the remainder taller). Markdown
//! constructs that span the cut point can violate this for a frame (an open
//! code fence, a split emphasis marker); the artifact is cosmetic and heals
//! as more text streams in, so truncation is not restricted to line
//! boundaries.

/// Oracle that reports the rendered height of `text` wrapped to `width`
/// columns.
///
/// Implementations must be deterministic and side-effect-free for a fixed
/// `(text, width)` pair. `width == 0` is outside the domain.
pub trait Measure {
    fn measure(&self, text: &str, width: u16) -> usize;
}

impl<F> Measure for F
where
    F: Fn(&str, u16) -> usize,
{
    fn measure(&self, text: &str, width: u16) -> usize {
        self(text, width)
    }
}

/// Return the longest suffix of `text` whose rendered height is at most
/// `max_lines` at the given `width`.
///
/// - `max_lines == 0` is a degenerate pass-through: the caller has no room
///   to render anything, so the text is returned unchanged.
/// - If the whole text already fits, it is returned as-is.
/// - Otherwise the minimal start offset whose suffix fits is located by
///   binary search. Candidate offsets are byte offsets snapped forward to
///   `char` boundaries, so the minimal-offset tie-break holds up to
///   boundary granularity.
/// - If not even the final character fits on its own (a single rendered
///   line exceeds the budget), the final source line is returned as a
///   floor; the window may then exceed the budget.
///
/// Precondition: `width > 0` whenever truncation is actually required.
/// The fitter never calls the oracle with an empty budget check of its own;
/// callers clamp viewport geometry before invoking it.
pub fn fit_to_viewport<'a>(text: &'a str, max_lines: usize, width: u16, oracle: &dyn Measure) -> &'a str {
    if max_lines == 0 || text.is_empty() {
        return text;
    }

    if oracle.measure(text, width) <= max_lines {
        return text;
    }

    let mut low = 0usize;
    let mut high = text.len();
    let mut best: Option<usize> = None;

    while low < high {
        let mut mid = low + (high - low) / 2;
        while mid < high && !text.is_char_boundary(mid) {
            mid += 1;
        }
        if mid == high {
            // No char boundary left to probe inside (low, high).
            break;
        }

        if oracle.measure(&text[mid..], width) <= max_lines {
            best = Some(mid);
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    match best {
        Some(start) => &text[start..],
        None => last_line(text),
    }
}

/// The trailing source line of `text`, keeping a final newline attached so
/// the result stays a suffix of the input.
fn last_line(text: &str) -> &str {
    let scan_end = if text.ends_with('\n') { text.len() - 1 } else { text.len() };
    match text[..scan_end].rfind('\n') {
        Some(idx) => &text[idx + 1..],
        None => text,
    }
}
