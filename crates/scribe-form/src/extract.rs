//! Keyword-rule field extraction from interview transcripts.
//!
//! Each rule pairs a target with a case-insensitive pattern. Rules are
//! evaluated in table order against every user turn, oldest first; the raw
//! turn text becomes the field value.

use regex::Regex;

use scribe_core::types::Turn;

use crate::record::{FormField, FormRecord};

/// Where a matching turn's text is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// A single field; the first matching turn wins.
    Field(FormField),
    /// The two other-income slots, filled in encounter order.
    OtherIncome,
}

/// One compiled extraction rule.
pub struct ExtractionRule {
    pub target: Target,
    pub pattern: Regex,
    /// Turns matching this pattern are never candidates for the rule.
    pub exclude: Option<Regex>,
}

impl ExtractionRule {
    /// Compile a rule. Panics on an invalid pattern; rule tables are constants.
    pub fn new(target: Target, pattern: &str, exclude: Option<&str>) -> Self {
        Self {
            target,
            pattern: Regex::new(pattern).expect("Invalid extraction regex"),
            exclude: exclude.map(|p| Regex::new(p).expect("Invalid exclusion regex")),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text) && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(text))
    }
}

const OTHER_INCOME: &str = r"(?i)\b(?:other|additional|extra|second|side)\s+income|\b(?:child\s+support|alimony|pension|disability\s+benefit|unemployment\s+benefit)";

/// Default rule table, in evaluation order.
///
/// Keywords anchor at the start of a word and match any continuation, so
/// "addresses" counts as "address". Short keywords that prefix unrelated
/// words end in an explicit boundary.
fn default_rules() -> Vec<ExtractionRule> {
    use FormField::*;

    let field_rules: Vec<(FormField, &str, Option<&str>)> = vec![
        (FullName, r"(?i)\b(?:name|called)", None),
        (DateOfBirth, r"(?i)\b(?:born|birth|dob\b)", None),
        (Phone, r"(?i)\b(?:phone|cell|mobile|telephone)", None),
        (Address, r"(?i)\b(?:address|live\s+at|street)", None),
        (State, r"(?i)\bstates?\b", None),
        (Language, r"(?i)\b(?:language|speak|english|spanish)", None),
        (
            HouseholdSize,
            r"(?i)\b(?:household\s+(?:size|of)|people\s+in\s+(?:my|our)\s+(?:home|house|household)|family\s+of|live\s+alone)",
            None,
        ),
        (
            Member1,
            r"(?i)\b(?:first\s+(?:household\s+)?member|member\s+(?:1|one)\b|spouse|partner|wife|husband)",
            Some(OTHER_INCOME),
        ),
        (
            Member2,
            r"(?i)\b(?:second\s+(?:household\s+)?member|member\s+(?:2|two)\b|child|sons?\b|daughter)",
            Some(OTHER_INCOME),
        ),
        (SsnLast4, r"(?i)\b(?:ssn|social\s+security\s+number|last\s+(?:four|4)\b)", None),
        (
            Citizenship,
            r"(?i)\b(?:citizen|immigra|green\s+card|permanent\s+resident|visa)",
            None,
        ),
        (Employment, r"(?i)\b(?:employ|unemploy|jobs?\b|work)", None),
        (
            Income,
            r"(?i)\b(?:income|salary|wage|earn|paycheck)",
            Some(OTHER_INCOME),
        ),
        (Rent, r"(?i)\b(?:rent|mortgage)", None),
        (
            Utilities,
            r"(?i)\b(?:utilit|electric|heating|water\s+bill|gas\s+bill)",
            None,
        ),
        (
            Assets,
            r"(?i)\b(?:asset|savings|bank\s+account|checking\s+account|vehicle|cars?\b)",
            None,
        ),
    ];

    let mut rules: Vec<ExtractionRule> = field_rules
        .into_iter()
        .map(|(field, pattern, exclude)| ExtractionRule::new(Target::Field(field), pattern, exclude))
        .collect();
    rules.push(ExtractionRule::new(Target::OtherIncome, OTHER_INCOME, None));
    rules
}

/// Projects a transcript onto a `FormRecord`.
///
/// Extraction is pure: the same transcript always yields the same record.
pub struct FieldExtractor {
    rules: Vec<ExtractionRule>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    /// Create an extractor with the default rule table.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Build a record from the user turns of `transcript`.
    ///
    /// A turn may fill several fields. A filled field is never overwritten;
    /// other-income matches go to the first empty slot and are dropped once
    /// both slots hold a value.
    pub fn extract(&self, transcript: &[Turn]) -> FormRecord {
        let mut record = FormRecord::new();

        for turn in transcript.iter().filter(|t| t.is_user()) {
            let text = turn.message.as_str();
            for rule in &self.rules {
                match rule.target {
                    Target::Field(field) => {
                        if record.is_empty(field) && rule.matches(text) {
                            record.fill(field, text);
                        }
                    }
                    Target::OtherIncome => {
                        if rule.matches(text) {
                            let _ = record.fill(FormField::OtherIncome1, text)
                                || record.fill(FormField::OtherIncome2, text);
                        }
                    }
                }
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::types::Sender;

    fn user(msg: &str) -> Turn {
        Turn::now("s", Sender::User, msg)
    }

    fn agent(msg: &str) -> Turn {
        Turn::now("s", Sender::Agent, msg)
    }

    fn extract(turns: &[Turn]) -> FormRecord {
        FieldExtractor::new().extract(turns)
    }

    #[test]
    fn test_single_address_turn_fills_only_address() {
        let record = extract(&[user("My address is 12 Main St")]);
        assert_eq!(record.get(FormField::Address), "My address is 12 Main St");
        assert_eq!(record.filled_count(), 1);
    }

    #[test]
    fn test_first_match_wins() {
        let record = extract(&[
            user("My address is 12 Main St"),
            user("Actually my address is 99 Oak Ave"),
        ]);
        assert_eq!(record.get(FormField::Address), "My address is 12 Main St");
    }

    #[test]
    fn test_other_income_fills_two_slots_and_drops_third() {
        let record = extract(&[
            user("I get child support of $200"),
            user("Other income: $50 from babysitting"),
            user("Also a pension of $300"),
        ]);
        assert_eq!(record.get(FormField::OtherIncome1), "I get child support of $200");
        assert_eq!(
            record.get(FormField::OtherIncome2),
            "Other income: $50 from babysitting"
        );
        assert!(record.iter().all(|(_, v)| v != "Also a pension of $300"));
    }

    #[test]
    fn test_other_income_does_not_fill_primary_income() {
        let record = extract(&[user("My other income is $100 a month")]);
        assert!(record.is_empty(FormField::Income));
        assert_eq!(
            record.get(FormField::OtherIncome1),
            "My other income is $100 a month"
        );
    }

    #[test]
    fn test_one_turn_can_fill_several_fields() {
        let text = "My address is 4 Elm Rd and my phone is 555-0100";
        let record = extract(&[user(text)]);
        assert_eq!(record.get(FormField::Address), text);
        assert_eq!(record.get(FormField::Phone), text);
    }

    #[test]
    fn test_agent_turns_are_ignored() {
        let record = extract(&[
            agent("What is your address?"),
            agent("What is your phone number?"),
        ]);
        assert_eq!(record.filled_count(), 0);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let record = extract(&[user("MY RENT IS $900")]);
        assert_eq!(record.get(FormField::Rent), "MY RENT IS $900");
    }

    #[test]
    fn test_keywords_match_inflected_forms() {
        let text = "Both addresses: 12 Main St; phones 555-0100";
        let record = extract(&[user(text)]);
        assert_eq!(record.get(FormField::Address), text);
        assert_eq!(record.get(FormField::Phone), text);

        let record = extract(&[user("I have two children and some savings")]);
        assert!(!record.is_empty(FormField::Member2));
        assert!(!record.is_empty(FormField::Assets));
    }

    #[test]
    fn test_keywords_anchor_at_word_start() {
        // "current" and "parent" must not read as rent; "unemployed" is still employment.
        let record = extract(&[user("I'm currently unemployed and live with a parent")]);
        assert!(record.is_empty(FormField::Rent));
        assert!(!record.is_empty(FormField::Employment));

        // Short keywords keep a closing boundary.
        let record = extract(&[user("We take care of the cats and sing songs")]);
        assert!(record.is_empty(FormField::Assets));
        assert!(record.is_empty(FormField::Member2));
    }

    #[test]
    fn test_child_support_is_other_income_not_a_member() {
        let record = extract(&[user("I get child support of $200")]);
        assert_eq!(record.get(FormField::OtherIncome1), "I get child support of $200");
        assert!(record.is_empty(FormField::Member2));
        assert!(record.is_empty(FormField::Member1));
        assert_eq!(record.filled_count(), 1);

        let record = extract(&[user("My child is 4"), user("Her child support is $150")]);
        assert_eq!(record.get(FormField::Member2), "My child is 4");
        assert_eq!(record.get(FormField::OtherIncome1), "Her child support is $150");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let turns = vec![
            agent("Hello! What is your full name?"),
            user("My name is Ana Lopez"),
            agent("Thanks. Your date of birth?"),
            user("I was born on 1990-04-02"),
            user("I earn $1,800 a month from my job"),
            user("child support $150"),
        ];
        let extractor = FieldExtractor::new();
        let first = extractor.extract(&turns);
        let second = extractor.extract(&turns);
        assert_eq!(first, second);
        assert_eq!(first.get(FormField::FullName), "My name is Ana Lopez");
        assert_eq!(first.get(FormField::DateOfBirth), "I was born on 1990-04-02");
        assert_eq!(
            first.get(FormField::Income),
            "I earn $1,800 a month from my job"
        );
        assert_eq!(first.get(FormField::Employment), first.get(FormField::Income));
    }

    #[test]
    fn test_extraction_does_not_touch_transcript() {
        let turns = vec![user("My phone is 555-0100")];
        let before = turns.clone();
        let _ = extract(&turns);
        assert_eq!(turns, before);
    }

    #[test]
    fn test_order_sensitivity() {
        let a = extract(&[user("phone 111"), user("phone 222")]);
        let b = extract(&[user("phone 222"), user("phone 111")]);
        assert_eq!(a.get(FormField::Phone), "phone 111");
        assert_eq!(b.get(FormField::Phone), "phone 222");
    }

    #[test]
    fn test_empty_turn_fills_nothing() {
        let record = extract(&[user(""), user("   ")]);
        assert_eq!(record.filled_count(), 0);
    }

    #[test]
    fn test_every_single_field_has_a_rule() {
        let extractor = FieldExtractor::new();
        for field in FormField::ALL {
            if matches!(field, FormField::OtherIncome1 | FormField::OtherIncome2) {
                continue;
            }
            assert!(
                extractor
                    .rules()
                    .iter()
                    .any(|r| r.target == Target::Field(field)),
                "no rule for {:?}",
                field
            );
        }
    }
}
