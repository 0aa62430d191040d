//! Field-name casing between the local model and the remote API.
//!
//! Local attributes are snake_case; a leading underscore marks a
//! server-assigned field that callers should not edit. The API speaks
//! camelCase.

/// `_serving_status` -> `servingStatus`, `budget_amount` -> `budgetAmount`.
pub fn to_external_name(local_name: &str) -> String {
    let trimmed = local_name.strip_prefix('_').unwrap_or(local_name);

    let mut joined = String::with_capacity(trimmed.len());
    for word in trimmed.split('_').filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            joined.extend(first.to_uppercase());
            joined.extend(chars.flat_map(char::to_lowercase));
        }
    }

    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `budgetAmount` -> `budget_amount`.
pub fn to_local_name(external_name: &str) -> String {
    let mut local = String::with_capacity(external_name.len() + 4);
    for (i, ch) in external_name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                local.push('_');
            }
            local.push(ch.to_ascii_lowercase());
        } else {
            local.push(ch);
        }
    }
    local
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn converts_plain_names() {
        assert_eq!(to_external_name("name"), "name");
        assert_eq!(to_external_name("budget_amount"), "budgetAmount");
        assert_eq!(to_external_name("automated_keywords_opt_in"), "automatedKeywordsOptIn");
    }

    #[test]
    fn strips_server_assigned_marker() {
        assert_eq!(to_external_name("_serving_status"), "servingStatus");
        assert_eq!(to_external_name("_id"), "id");
    }

    #[test]
    fn title_cases_each_word() {
        // Upper-case runs inside a word are folded, like str.title().
        assert_eq!(to_external_name("adam_ID"), "adamId");
        assert_eq!(to_external_name("CPA_goal"), "cpaGoal");
    }

    #[test]
    fn tolerates_empty_segments() {
        assert_eq!(to_external_name("daily__budget_"), "dailyBudget");
        assert_eq!(to_external_name(""), "");
        assert_eq!(to_external_name("_"), "");
    }

    #[test]
    fn local_name_inverts_camel_case() {
        assert_eq!(to_local_name("dailyBudgetAmount"), "daily_budget_amount");
        assert_eq!(to_local_name("id"), "id");
    }

    proptest! {
        #[test]
        fn snake_case_round_trips(words in prop::collection::vec("[a-z][a-z0-9]{0,7}", 1..5)) {
            let local = words.join("_");
            prop_assert_eq!(to_local_name(&to_external_name(&local)), local);
        }

        #[test]
        fn leading_underscore_never_changes_external_name(words in prop::collection::vec("[a-z]{1,6}", 1..4)) {
            let local = words.join("_");
            prop_assert_eq!(to_external_name(&format!("_{local}")), to_external_name(&local));
        }
    }
}
