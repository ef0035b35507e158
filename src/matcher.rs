use crate::types::{Listing, Subscription};

/// Cheapest listing; on a tie the earliest one wins. `None` for an empty slice.
pub fn cheapest(listings: &[Listing]) -> Option<&Listing> {
    listings.iter().fold(None, |best: Option<&Listing>, l| match best {
        Some(b) if b.price <= l.price => Some(b),
        _ => Some(l),
    })
}

/// Outcome of matching one subscription against a scan result.
#[derive(Debug, PartialEq)]
pub enum MatchOutcome<'a> {
    /// Nothing was listed.
    Empty,
    /// Cheapest listing is above the ceiling.
    AboveCeiling(&'a Listing),
    Match(&'a Listing),
}

pub fn evaluate<'a>(sub: &Subscription, listings: &'a [Listing]) -> MatchOutcome<'a> {
    match cheapest(listings) {
        None => MatchOutcome::Empty,
        Some(l) if sub.accepts(l.price) => MatchOutcome::Match(l),
        Some(l) => MatchOutcome::AboveCeiling(l),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(name: &str, price: f64) -> Listing {
        Listing {
            name: name.to_string(),
            price,
            url: format!("https://funpay.com/{name}"),
            category: "cat".to_string(),
        }
    }

    fn sub(ceiling: f64) -> Subscription {
        Subscription {
            user_id: 1,
            category: "cat".to_string(),
            lot_name: "item".to_string(),
            min_price: ceiling,
        }
    }

    #[test]
    fn empty_has_no_cheapest() {
        assert!(cheapest(&[]).is_none());
        assert_eq!(evaluate(&sub(10.0), &[]), MatchOutcome::Empty);
    }

    #[test]
    fn picks_minimum_regardless_of_position() {
        let lots = vec![lot("a", 150.0), lot("b", 99.0), lot("c", 120.0)];
        assert_eq!(cheapest(&lots).unwrap().name, "b");

        let lots = vec![lot("a", 5.0), lot("b", 9.0)];
        assert_eq!(cheapest(&lots).unwrap().name, "a");
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let lots = vec![lot("x", 20.0), lot("first", 10.0), lot("second", 10.0)];
        assert_eq!(cheapest(&lots).unwrap().name, "first");
    }

    #[test]
    fn ceiling_boundary_is_a_match() {
        let lots = vec![lot("a", 100.0)];
        assert!(matches!(evaluate(&sub(100.0), &lots), MatchOutcome::Match(l) if l.name == "a"));
    }

    #[test]
    fn above_ceiling_reports_cheapest() {
        let lots = vec![lot("a", 60.0), lot("b", 70.0)];
        assert!(matches!(
            evaluate(&sub(50.0), &lots),
            MatchOutcome::AboveCeiling(l) if l.name == "a"
        ));
    }
}
