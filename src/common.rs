use std::fmt;

/// A single normalized homology hit: one row of a tbl/domtblout table,
/// mapping a target sequence to a KO profile with alignment coordinates
/// and statistical scores.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub target_id: String,
    /// KO (KEGG Ortholog) identifier of the query profile, e.g. "K00001".
    pub ko_id: String,
    pub hmm_from: i64,
    pub hmm_to: i64,
    /// Alignment coordinates on the target. `ali_from > ali_to` encodes
    /// a minus-strand hit.
    pub ali_from: i64,
    pub ali_to: i64,
    /// Bit score of the hit.
    pub score: f64,
    pub e_value: f64,
}

impl HitRecord {
    pub fn strand(&self) -> Strand {
        if self.ali_to >= self.ali_from {
            Strand::Plus
        } else {
            Strand::Minus
        }
    }

    /// Lower alignment coordinate regardless of strand.
    pub fn ali_start(&self) -> i64 {
        self.ali_from.min(self.ali_to)
    }

    /// Upper alignment coordinate regardless of strand.
    pub fn ali_end(&self) -> i64 {
        self.ali_from.max(self.ali_to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(ali_from: i64, ali_to: i64) -> HitRecord {
        HitRecord {
            target_id: "contig_1".to_string(),
            ko_id: "K00001".to_string(),
            hmm_from: 1,
            hmm_to: 100,
            ali_from,
            ali_to,
            score: 50.0,
            e_value: 1e-20,
        }
    }

    #[test]
    fn test_strand_from_coordinates() {
        assert_eq!(hit(10, 50).strand(), Strand::Plus);
        assert_eq!(hit(50, 10).strand(), Strand::Minus);
        // Equal coordinates count as plus strand
        assert_eq!(hit(10, 10).strand(), Strand::Plus);
    }

    #[test]
    fn test_span_normalization() {
        let h = hit(50, 10);
        assert_eq!(h.ali_start(), 10);
        assert_eq!(h.ali_end(), 50);
    }
}
