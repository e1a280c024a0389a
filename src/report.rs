//! Line items handed to the PDF renderer.

use std::collections::BTreeMap;

use crate::model::cash::CashSummary;
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::model::session::SessionTotals;

pub fn export_lines(
    departments: &[Department],
    employees: &[Employee],
    sessions: &BTreeMap<String, SessionTotals>,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(3 + departments.len() + employees.len() + sessions.len());

    lines.push("Departments".to_string());
    lines.extend(departments.iter().map(|d| format!("{}: {}", d.id, d.name)));

    lines.push("Employees".to_string());
    lines.extend(
        employees
            .iter()
            .map(|e| format!("{}: {} (Dept: {})", e.id, e.name, e.department_id)),
    );

    lines.push("Sessions (Aggregated)".to_string());
    lines.extend(sessions.iter().map(|(employee_id, totals)| {
        format!(
            "Employee {}: Expected {}, Actual {}",
            employee_id, totals.expected_total, totals.actual_total
        )
    }));

    lines
}

pub fn cash_summary_lines(summary: &CashSummary) -> Vec<String> {
    std::iter::once("Financial Summary".to_string())
        .chain(
            summary
                .fields()
                .iter()
                .map(|(key, value)| format!("{}: {:?}", title_case(key), value)),
        )
        .collect()
}

/// `gross_margin` -> `Gross Margin`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
