//! Capacity / jurisdiction partial order.
//!
//! A capacity is a named right (`GOVERNANCE:OVERRIDE`, `METRIC.WRITE`); a
//! jurisdiction is a hierarchical resource path (`metric.a`, `METRIC.*`).
//! Both are segmented on `.` and `:` and compared the same way: a held
//! pattern covers a queried value if every segment matches exactly, or the
//! held pattern terminates in a `*` segment that matches any remaining
//! suffix (including the empty suffix).

fn segments(s: &str) -> Vec<&str> {
  s.split(|c| c == '.' || c == ':').collect()
}

/// Does `held` (a delegation's capacity or jurisdiction) cover `queried`
/// under the dotted-prefix partial order?
pub fn covers(held: &str, queried: &str) -> bool {
  if held == "*" {
    return true;
  }
  let held_segs = segments(held);
  let queried_segs = segments(queried);
  for (i, h) in held_segs.iter().enumerate() {
    if *h == "*" {
      return true;
    }
    match queried_segs.get(i) {
      Some(q) if q == h => continue,
      _ => return false,
    }
  }
  // Held has no more segments: it covers queried only if queried has no
  // extra segments beyond it (exact match) — a non-wildcard capacity
  // does not implicitly cover its children.
  held_segs.len() == queried_segs.len()
}

/// `a` and `b` conflict (neither amplifies the other) only relevant for
/// non-escalation checks at grant time: granting `(capacity, jurisdiction)`
/// requires the granter to already be covered for it.
pub fn is_ancestor_or_equal(held: &str, queried: &str) -> bool {
  covers(held, queried)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exact_match_covers() {
    assert!(covers("metric.a", "metric.a"));
  }

  #[test]
  fn wildcard_covers_everything() {
    assert!(covers("*", "metric.a"));
    assert!(covers("*", "GOVERNANCE:OVERRIDE"));
  }

  #[test]
  fn dotted_wildcard_prefix_covers_children() {
    assert!(covers("METRIC.*", "METRIC.WRITE"));
    assert!(covers("METRIC.*", "METRIC.WRITE.SUB"));
  }

  #[test]
  fn non_wildcard_does_not_cover_children() {
    assert!(!covers("METRIC.WRITE", "METRIC.WRITE.SUB"));
  }

  #[test]
  fn disjoint_segments_do_not_cover() {
    assert!(!covers("metric.a", "metric.b"));
  }

  #[test]
  fn colon_and_dot_delimiters_interchange() {
    assert!(covers("GOVERNANCE:*", "GOVERNANCE:OVERRIDE"));
    assert!(covers("GOVERNANCE.*", "GOVERNANCE:OVERRIDE"));
  }
}
