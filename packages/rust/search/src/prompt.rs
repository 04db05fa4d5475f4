//! Prompt templates for the compliance search backend.
//!
//! Report renderers and the analyst agent parse the category labels and the
//! findings table header, so both are fixed.

use std::fmt::Write as _;

use crate::category::RiskCategory;

/// Header row of the per-entity findings table.
pub const FINDINGS_TABLE_HEADER: &str =
    "| Risk Category | Findings (Yes/No) | Details | Source/Link |";

/// Line required when nothing adverse is found.
pub const NO_ADVERSE_RESULTS: &str = "No adverse results found";

/// Broad EDD prompt for one or more named entities or persons.
pub fn compliance_prompt(target: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are acting as a compliance analyst performing Enhanced Due Diligence (EDD) \
         public domain checks in line with CBUAE requirements.\n\n",
    );
    let _ = writeln!(prompt, "For the following entities/persons: {target}\n");
    prompt.push_str(
        "When providing the results, clearly label each entry with its category (Company, UBO, \
         Authorized Person, Subsidiary/Partner, Counterparty). If the name does not fall under \
         one of these, assign it to \"Other (related category)\" and specify what that category is.\n\n\
         If the inserted input is a company name, start by giving at least two short lines about \
         the company: what it is, what it does, and where it is located. Keep this brief (no more \
         than 2 lines) before moving on to the adverse media and public domain checks.\n\n\
         If the inserted input is a person's name, skip the company introduction and continue \
         directly with the public domain checks.\n\n\
         Perform a deep public domain search (Google, news sources, regulatory filings, sanctions \
         lists, legal proceedings, reliable media) and identify any red flags across these categories:\n\n",
    );

    for category in &RiskCategory::STANDARD {
        let _ = writeln!(prompt, "- {}: {}.", category.label(), category.scope());
    }

    prompt.push_str("\nOutput Format (for each entity/person):\n\nName: [Entity/Person]\n\nFindings Table:\n");
    let _ = writeln!(prompt, "{FINDINGS_TABLE_HEADER}\n");
    prompt.push_str(
        "Summary: Concise risk assessment (is this entity/person clear, or do they present \
         compliance concerns?).\n\n\
         Reference Links: Direct URLs to key sources.\n\n\
         Make the results structured, clear, and ready to paste into an onboarding system. For \
         each entity/person, explicitly state whether adverse media or other negative findings exist. ",
    );
    let _ = write!(
        prompt,
        "If none are found, clearly write \"{NO_ADVERSE_RESULTS}\" under that individual's section."
    );

    prompt
}

/// Narrow prompt scoped to one category, embedding the caller's sub-prompt verbatim.
pub fn deep_dive_prompt(category: &RiskCategory, target: &str, sub_prompt: &str) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are acting as a compliance analyst performing Enhanced Due Diligence (EDD) public \
         domain checks in line with CBUAE requirements within the {} category.\n",
        category.label()
    );
    let _ = writeln!(prompt, "For the following entities/persons: {target}");
    let _ = writeln!(prompt, "{sub_prompt}\n");
    let _ = writeln!(
        prompt,
        "Perform a deep public domain search (Google, news sources, regulatory filings, sanctions \
         lists, legal proceedings, reliable media) and identify any red flags for the given \
         category ({}).\n",
        category.scope()
    );
    prompt.push_str(
        "Summary: in depth risk assessment (is this entity/person clear, or do they present \
         compliance concerns?).\n\n\
         Reference Links: Direct URLs to key sources.\n\n\
         Make the results structured, clear. For each entity/person, explicitly state whether \
         adverse media or other negative findings exist. ",
    );
    let _ = write!(prompt, "If none are found, clearly write \"{NO_ADVERSE_RESULTS}\".");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compliance_prompt_lists_every_category_and_table() {
        let prompt = compliance_prompt("Acme Holdings");
        assert!(prompt.contains("For the following entities/persons: Acme Holdings"));
        for category in &RiskCategory::STANDARD {
            assert!(prompt.contains(category.label()), "missing {category}");
        }
        assert!(prompt.contains(FINDINGS_TABLE_HEADER));
        assert!(prompt.contains(NO_ADVERSE_RESULTS));
    }

    #[test]
    fn deep_dive_prompt_embeds_sub_prompt_verbatim() {
        let sub = "Check 2019 court filings in Dubai, especially {braces} and \"quotes\".";
        let prompt = deep_dive_prompt(&RiskCategory::MoneyLaundering, "Jane Doe", sub);
        assert!(prompt.contains(sub));
        assert!(prompt.contains("within the Money Laundering category"));
        assert!(prompt.contains("Jane Doe"));
    }
}
