//! The fixed interview plan.

/// One question topic in the interview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Topic {
    pub key: &'static str,
    /// What the agent should ask about, phrased for the model.
    pub prompt: &'static str,
}

const fn topic(key: &'static str, prompt: &'static str) -> Topic {
    Topic { key, prompt }
}

/// Question topics in the order the agent should cover them.
///
/// The agent is told to stop asking after the last topic. Nothing counts
/// turns against this list.
pub const CONVERSATION_PLAN: [Topic; 15] = [
    topic("full_name", "the applicant's full legal name"),
    topic("dob", "their date of birth"),
    topic("phone", "a phone number where they can be reached"),
    topic("address", "their home address, including the state"),
    topic("language", "the language they prefer to use"),
    topic("household_size", "how many people live in their household"),
    topic("member1", "the name and relationship of the first other household member"),
    topic("member2", "the name and relationship of the second other household member"),
    topic("ssn_last4", "the last four digits of their Social Security number"),
    topic("citizenship", "their citizenship or immigration status"),
    topic("employment", "whether they are currently employed, and where"),
    topic("income", "their monthly income from work"),
    topic("other_income", "any other income such as child support, pension or benefits"),
    topic("housing_costs", "their monthly rent or mortgage and utility costs"),
    topic("assets", "savings, bank accounts, vehicles or other assets"),
];

/// The plan as numbered lines, one topic per line.
pub fn numbered_plan() -> String {
    CONVERSATION_PLAN
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. Ask about {}.", i + 1, t.prompt))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_has_fifteen_unique_topics() {
        assert_eq!(CONVERSATION_PLAN.len(), 15);
        let mut keys: Vec<&str> = CONVERSATION_PLAN.iter().map(|t| t.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 15);
    }

    #[test]
    fn test_numbered_plan_order() {
        let plan = numbered_plan();
        let lines: Vec<&str> = plan.lines().collect();
        assert_eq!(lines.len(), 15);
        assert!(lines[0].starts_with("1. Ask about the applicant's full legal name"));
        assert!(lines[14].starts_with("15. Ask about savings"));
    }
}
