use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{BranchRevenue, MonthlyRevenue, PaymentError, RevenueRow};

/// Sum of every row, regardless of doctor or branch.
pub fn total(rows: &[RevenueRow]) -> f64 {
    rows.iter().map(|r| r.amount).sum()
}

/// Totals per calendar month of the given year, one entry per month even when
/// a month earned nothing.
pub fn monthly_trend(rows: &[RevenueRow], year: i32) -> Vec<MonthlyRevenue> {
    (1..=12)
        .map(|month| MonthlyRevenue {
            month,
            total: rows
                .iter()
                .filter(|r| r.date.year() == year && r.date.month() == month)
                .map(|r| r.amount)
                .sum(),
        })
        .collect()
}

pub fn totals_by_branch(rows: &[RevenueRow]) -> HashMap<Uuid, f64> {
    let mut totals: HashMap<Uuid, f64> = HashMap::new();
    for row in rows {
        *totals.entry(row.branch_id).or_insert(0.0) += row.amount;
    }
    totals
}

/// Revenue reports over settled payments. Rows are fetched once per request
/// and every report reduces them in-process.
pub struct RevenueService {
    supabase: SupabaseClient,
}

impl RevenueService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn total_revenue(&self, auth_token: &str) -> Result<f64, PaymentError> {
        let rows = self.load_rows(auth_token).await?;
        Ok(total(&rows))
    }

    pub async fn revenue_for_branch(
        &self,
        branch_id: Uuid,
        auth_token: &str,
    ) -> Result<f64, PaymentError> {
        if !self.row_exists("branches", branch_id, auth_token).await? {
            return Err(PaymentError::BranchNotFound);
        }

        let rows = self.load_rows(auth_token).await?;
        Ok(rows
            .iter()
            .filter(|r| r.branch_id == branch_id)
            .map(|r| r.amount)
            .sum())
    }

    pub async fn revenue_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<f64, PaymentError> {
        if !self.row_exists("doctors", doctor_id, auth_token).await? {
            return Err(PaymentError::DoctorNotFound);
        }

        let rows = self.load_rows(auth_token).await?;
        Ok(rows
            .iter()
            .filter(|r| r.doctor_id == doctor_id)
            .map(|r| r.amount)
            .sum())
    }

    pub async fn revenue_for_doctor_in_branch(
        &self,
        doctor_id: Uuid,
        branch_id: Uuid,
        auth_token: &str,
    ) -> Result<f64, PaymentError> {
        if !self.row_exists("doctors", doctor_id, auth_token).await? {
            return Err(PaymentError::DoctorNotFound);
        }
        if !self.row_exists("branches", branch_id, auth_token).await? {
            return Err(PaymentError::BranchNotFound);
        }

        let rows = self.load_rows(auth_token).await?;
        Ok(rows
            .iter()
            .filter(|r| r.doctor_id == doctor_id && r.branch_id == branch_id)
            .map(|r| r.amount)
            .sum())
    }

    pub async fn revenue_for_month(
        &self,
        year: i32,
        month: u32,
        auth_token: &str,
    ) -> Result<f64, PaymentError> {
        if !(1..=12).contains(&month) {
            return Err(PaymentError::Validation(format!("Invalid month: {}", month)));
        }

        let rows = self.load_rows(auth_token).await?;
        Ok(rows
            .iter()
            .filter(|r| r.date.year() == year && r.date.month() == month)
            .map(|r| r.amount)
            .sum())
    }

    pub async fn revenue_for_year(
        &self,
        year: i32,
        auth_token: &str,
    ) -> Result<f64, PaymentError> {
        let rows = self.load_rows(auth_token).await?;
        Ok(rows
            .iter()
            .filter(|r| r.date.year() == year)
            .map(|r| r.amount)
            .sum())
    }

    pub async fn monthly_trend_for_year(
        &self,
        year: i32,
        auth_token: &str,
    ) -> Result<Vec<MonthlyRevenue>, PaymentError> {
        let rows = self.load_rows(auth_token).await?;
        Ok(monthly_trend(&rows, year))
    }

    pub async fn revenue_by_branch(
        &self,
        auth_token: &str,
    ) -> Result<Vec<BranchRevenue>, PaymentError> {
        let rows = self.load_rows(auth_token).await?;
        let totals = totals_by_branch(&rows);

        let branches: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/branches?select=id,name&order=name.asc",
                Some(auth_token),
                None,
            )
            .await?;

        let mut breakdown = Vec::with_capacity(branches.len());
        for branch in branches {
            let branch_id = branch
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| PaymentError::Database("Malformed branch row".to_string()))?;
            let branch_name = branch
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            breakdown.push(BranchRevenue {
                branch_id,
                branch_name,
                total: totals.get(&branch_id).copied().unwrap_or(0.0),
            });
        }

        Ok(breakdown)
    }

    async fn row_exists(
        &self,
        table: &str,
        id: Uuid,
        auth_token: &str,
    ) -> Result<bool, PaymentError> {
        let path = format!("/rest/v1/{}?id=eq.{}&select=id", table, id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(!rows.is_empty())
    }

    /// Joins Paid payments with their appointments in-process; PostgREST gives
    /// us the two result sets and we stitch them by appointment id.
    async fn load_rows(&self, auth_token: &str) -> Result<Vec<RevenueRow>, PaymentError> {
        let payments: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/payments?status=eq.paid&select=amount,appointment_id",
                Some(auth_token),
                None,
            )
            .await?;

        if payments.is_empty() {
            return Ok(Vec::new());
        }

        let appointment_ids: Vec<String> = payments
            .iter()
            .filter_map(|p| p.get("appointment_id").and_then(Value::as_str))
            .map(String::from)
            .collect();

        let path = format!(
            "/rest/v1/appointments?id=in.({})&select=id,doctor_id,branch_id,date",
            appointment_ids.join(",")
        );
        let appointments: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let mut by_id: HashMap<String, Value> = HashMap::new();
        for appointment in appointments {
            if let Some(id) = appointment.get("id").and_then(Value::as_str) {
                by_id.insert(id.to_string(), appointment.clone());
            }
        }

        let mut rows = Vec::with_capacity(payments.len());
        for payment in payments {
            let amount = payment
                .get("amount")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            let appointment = payment
                .get("appointment_id")
                .and_then(Value::as_str)
                .and_then(|id| by_id.get(id));

            // A payment whose appointment is gone carries no branch context;
            // skip it rather than fail the whole report.
            let Some(appointment) = appointment else {
                continue;
            };

            let doctor_id = parse_uuid(appointment, "doctor_id")?;
            let branch_id = parse_uuid(appointment, "branch_id")?;
            let date = appointment
                .get("date")
                .and_then(Value::as_str)
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .ok_or_else(|| PaymentError::Database("Malformed appointment date".to_string()))?;

            rows.push(RevenueRow {
                amount,
                doctor_id,
                branch_id,
                date,
            });
        }

        Ok(rows)
    }
}

fn parse_uuid(row: &Value, field: &str) -> Result<Uuid, PaymentError> {
    row.get(field)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| PaymentError::Database(format!("Missing field: {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(amount: f64, branch: Uuid, doctor: Uuid, date: &str) -> RevenueRow {
        RevenueRow {
            amount,
            doctor_id: doctor,
            branch_id: branch,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        }
    }

    #[test]
    fn total_sums_all_rows() {
        let b = Uuid::new_v4();
        let d = Uuid::new_v4();
        let rows = vec![
            row(350.0, b, d, "2026-01-10"),
            row(200.0, b, d, "2026-02-05"),
        ];
        assert_eq!(total(&rows), 550.0);
    }

    #[test]
    fn monthly_trend_buckets_by_month_and_fills_empty_months() {
        let b = Uuid::new_v4();
        let d = Uuid::new_v4();
        let rows = vec![
            row(100.0, b, d, "2026-01-10"),
            row(150.0, b, d, "2026-01-20"),
            row(300.0, b, d, "2026-03-01"),
            row(999.0, b, d, "2025-03-01"),
        ];

        let trend = monthly_trend(&rows, 2026);
        assert_eq!(trend.len(), 12);
        assert_eq!(trend[0].total, 250.0);
        assert_eq!(trend[1].total, 0.0);
        assert_eq!(trend[2].total, 300.0);
    }

    #[test]
    fn totals_by_branch_groups_rows() {
        let b1 = Uuid::new_v4();
        let b2 = Uuid::new_v4();
        let d = Uuid::new_v4();
        let rows = vec![
            row(100.0, b1, d, "2026-01-10"),
            row(250.0, b2, d, "2026-01-11"),
            row(50.0, b1, d, "2026-01-12"),
        ];

        let totals = totals_by_branch(&rows);
        assert_eq!(totals.get(&b1), Some(&150.0));
        assert_eq!(totals.get(&b2), Some(&250.0));
    }
}
