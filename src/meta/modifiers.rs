use std::fmt;

bitflags::bitflags! {
    /// Declaration modifiers of a type, executable or field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        /// Visible everywhere.
        const PUBLIC = 1 << 0;
        /// Visible only to the declaring type.
        const PRIVATE = 1 << 1;
        /// Visible to the declaring type and subtypes.
        const PROTECTED = 1 << 2;
        /// Belongs to the type rather than an instance.
        const STATIC = 1 << 3;
        /// Cannot be overridden or reassigned.
        const FINAL = 1 << 4;
        /// Has no implementation.
        const ABSTRACT = 1 << 5;
        /// Runs under the instance monitor.
        const SYNCHRONIZED = 1 << 6;
        /// Implemented by the host.
        const NATIVE = 1 << 7;
    }
}

const KEYWORDS: [(&str, Modifiers); 8] = [
    ("public", Modifiers::PUBLIC),
    ("private", Modifiers::PRIVATE),
    ("protected", Modifiers::PROTECTED),
    ("static", Modifiers::STATIC),
    ("final", Modifiers::FINAL),
    ("abstract", Modifiers::ABSTRACT),
    ("synchronized", Modifiers::SYNCHRONIZED),
    ("native", Modifiers::NATIVE),
];

impl Modifiers {
    /// Look up a single modifier keyword such as `public`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        KEYWORDS.iter().find(|(word, _)| *word == keyword).map(|(_, flag)| *flag)
    }

    /// Whether this pattern mask is a non-empty subset of `candidate`.
    pub fn matched_by(self, candidate: Modifiers) -> bool {
        !self.is_empty() && candidate.contains(self)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = KEYWORDS
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(word, _)| *word)
            .collect();
        write!(f, "{}", words.join(" "))
    }
}
