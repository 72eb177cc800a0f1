//! The structured record: one string value per closed form field.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// The closed set of fields on the application form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    FullName,
    DateOfBirth,
    Phone,
    Address,
    HouseholdSize,
    Member1,
    Member2,
    SsnLast4,
    Citizenship,
    Employment,
    Income,
    OtherIncome1,
    OtherIncome2,
    Rent,
    Utilities,
    Assets,
    State,
    Language,
}

impl FormField {
    pub const COUNT: usize = 18;

    /// Every field, in record order.
    pub const ALL: [FormField; FormField::COUNT] = [
        FormField::FullName,
        FormField::DateOfBirth,
        FormField::Phone,
        FormField::Address,
        FormField::HouseholdSize,
        FormField::Member1,
        FormField::Member2,
        FormField::SsnLast4,
        FormField::Citizenship,
        FormField::Employment,
        FormField::Income,
        FormField::OtherIncome1,
        FormField::OtherIncome2,
        FormField::Rent,
        FormField::Utilities,
        FormField::Assets,
        FormField::State,
        FormField::Language,
    ];

    /// Stable snake_case key used in JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            FormField::FullName => "full_name",
            FormField::DateOfBirth => "dob",
            FormField::Phone => "phone",
            FormField::Address => "address",
            FormField::HouseholdSize => "household_size",
            FormField::Member1 => "member1",
            FormField::Member2 => "member2",
            FormField::SsnLast4 => "ssn_last4",
            FormField::Citizenship => "citizenship",
            FormField::Employment => "employment",
            FormField::Income => "income",
            FormField::OtherIncome1 => "other_income_1",
            FormField::OtherIncome2 => "other_income_2",
            FormField::Rent => "rent",
            FormField::Utilities => "utilities",
            FormField::Assets => "assets",
            FormField::State => "state",
            FormField::Language => "language",
        }
    }

    /// Human-readable label printed on the document.
    pub fn label(&self) -> &'static str {
        match self {
            FormField::FullName => "Full Name",
            FormField::DateOfBirth => "Date of Birth",
            FormField::Phone => "Phone",
            FormField::Address => "Address",
            FormField::HouseholdSize => "Household Size",
            FormField::Member1 => "Household Member 1",
            FormField::Member2 => "Household Member 2",
            FormField::SsnLast4 => "SSN (last 4)",
            FormField::Citizenship => "Citizenship Status",
            FormField::Employment => "Employment",
            FormField::Income => "Monthly Income",
            FormField::OtherIncome1 => "Other Income 1",
            FormField::OtherIncome2 => "Other Income 2",
            FormField::Rent => "Rent / Mortgage",
            FormField::Utilities => "Utilities",
            FormField::Assets => "Assets",
            FormField::State => "State",
            FormField::Language => "Preferred Language",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// A value for every form field; unset fields hold the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormRecord {
    values: [String; FormField::COUNT],
}

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FormField) -> &str {
        &self.values[field.index()]
    }

    pub fn is_empty(&self, field: FormField) -> bool {
        self.values[field.index()].is_empty()
    }

    /// Set `field` only if it has no value yet. Returns whether it was set.
    pub fn fill(&mut self, field: FormField, value: &str) -> bool {
        let slot = &mut self.values[field.index()];
        if !slot.is_empty() || value.is_empty() {
            return false;
        }
        *slot = value.to_string();
        true
    }

    /// Number of fields holding a value.
    pub fn filled_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_empty()).count()
    }

    /// `(field, value)` pairs in record order.
    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        FormField::ALL
            .iter()
            .map(move |f| (*f, self.values[f.index()].as_str()))
    }
}

impl Serialize for FormRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FormField::COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.key(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_discriminants() {
        for (i, field) in FormField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i, "{:?}", field);
        }
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<&str> = FormField::ALL.iter().map(|f| f.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), FormField::COUNT);
    }

    #[test]
    fn test_new_record_is_all_empty() {
        let record = FormRecord::new();
        assert_eq!(record.filled_count(), 0);
        assert!(FormField::ALL.iter().all(|f| record.get(*f).is_empty()));
    }

    #[test]
    fn test_fill_is_first_write_wins() {
        let mut record = FormRecord::new();
        assert!(record.fill(FormField::Phone, "555-0100"));
        assert!(!record.fill(FormField::Phone, "555-0199"));
        assert_eq!(record.get(FormField::Phone), "555-0100");
        assert_eq!(record.filled_count(), 1);
    }

    #[test]
    fn test_fill_ignores_empty_value() {
        let mut record = FormRecord::new();
        assert!(!record.fill(FormField::State, ""));
        assert!(record.is_empty(FormField::State));
    }

    #[test]
    fn test_serializes_every_key() {
        let mut record = FormRecord::new();
        record.fill(FormField::Address, "12 Main St");
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), FormField::COUNT);
        assert_eq!(obj["address"], "12 Main St");
        assert_eq!(obj["other_income_2"], "");
    }
}
