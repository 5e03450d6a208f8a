//! Rule documents and the loaded rule set.
//!
//! Rules are structured data: category files hold condition trees and action
//! blocks that the engine evaluates without any code generation.

mod parser;
mod store;

pub use parser::{
    Rule, RuleAction, RuleDocument, RuleError, DEFAULT_ACTION_TYPE, DEFAULT_URGENCY_SCORE,
};
pub use store::{
    categories_for, RuleCategory, RuleCounts, RuleRef, RuleSet, RuleSummary, FARM_RULE_CATEGORIES,
};
