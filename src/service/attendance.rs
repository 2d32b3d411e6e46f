//! Attendance tracker: `NoRecord -> CheckedIn -> CheckedOut` per employee and day.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::HrPolicy;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{Attendance, AttendanceQuery, AttendanceStatus, NewAttendance};
use crate::store::{HrStore, Page};

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedHours {
    pub work_hours: Decimal,
    pub extra_hours: Decimal,
}

impl WorkedHours {
    /// Both values with exactly two decimals, e.g. `("9.00", "1.00")`.
    pub fn formatted(&self) -> (String, String) {
        (format_hours(self.work_hours), format_hours(self.extra_hours))
    }
}

pub fn format_hours(hours: Decimal) -> String {
    format!("{:.2}", hours)
}

/// Hours between two times of the same day, rounded to two decimals.
///
/// Spans crossing midnight are not supported and are rejected.
pub fn worked_hours(
    check_in: NaiveTime,
    check_out: NaiveTime,
    standard_hours: Decimal,
) -> AppResult<WorkedHours> {
    if check_out < check_in {
        return Err(AppError::CheckOutBeforeCheckIn);
    }

    let seconds = check_out.signed_duration_since(check_in).num_seconds();
    let work_hours = (Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let extra_hours = if work_hours > standard_hours {
        work_hours - standard_hours
    } else {
        Decimal::ZERO
    };

    Ok(WorkedHours {
        work_hours,
        extra_hours,
    })
}

/// TIME columns keep whole seconds.
fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

#[instrument(skip(store, caller), fields(employee_id = caller.employee_id, user = %caller.username))]
pub async fn check_in<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    now: NaiveDateTime,
) -> AppResult<Attendance> {
    let today = now.date();

    if store.employee(caller.employee_id).await?.is_none() {
        return Err(AppError::NotFound("Employee"));
    }

    if store.attendance_on(caller.employee_id, today).await?.is_some() {
        return Err(AppError::AlreadyCheckedIn);
    }

    let record = store
        .insert_attendance(NewAttendance {
            employee_id: caller.employee_id,
            date: today,
            check_in: Some(whole_seconds(now.time())),
            check_out: None,
            work_hours: None,
            extra_hours: None,
            status: AttendanceStatus::Present,
        })
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent check-in
            AppError::DuplicateAttendance => AppError::AlreadyCheckedIn,
            other => other,
        })?;

    info!(attendance_id = record.id, "Checked in");
    Ok(record)
}

#[instrument(skip(store, policy, caller), fields(employee_id = caller.employee_id))]
pub async fn check_out<S: HrStore>(
    store: &S,
    policy: &HrPolicy,
    caller: &AuthUser,
    now: NaiveDateTime,
) -> AppResult<Attendance> {
    let record = store
        .attendance_on(caller.employee_id, now.date())
        .await?
        .ok_or(AppError::NoCheckInFound)?;

    if record.check_out.is_some() {
        return Err(AppError::AlreadyCheckedOut);
    }
    let check_in = record.check_in.ok_or(AppError::NoCheckInFound)?;
    let check_out = whole_seconds(now.time());

    let hours = worked_hours(check_in, check_out, policy.standard_work_hours)?;
    let (work_hours, extra_hours) = hours.formatted();

    let record = store
        .record_check_out(record.id, check_out, work_hours, extra_hours)
        .await?;

    info!(
        attendance_id = record.id,
        work_hours = ?record.work_hours,
        extra_hours = ?record.extra_hours,
        "Checked out"
    );
    Ok(record)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlySummary {
    pub month: u32,
    pub year: i32,
    /// Number of attendance records in the month
    pub total_days: u32,
    pub present: u32,
    pub absent: u32,
    pub half_day: u32,
    pub on_leave: u32,
}

impl MonthlySummary {
    pub fn tally(month: u32, year: i32, records: &[Attendance]) -> Self {
        let mut summary = MonthlySummary {
            month,
            year,
            total_days: records.len() as u32,
            present: 0,
            absent: 0,
            half_day: 0,
            on_leave: 0,
        };
        for record in records {
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::HalfDay => summary.half_day += 1,
                AttendanceStatus::OnLeave => summary.on_leave += 1,
            }
        }
        summary
    }
}

/// Employees always get their own month; admins the filtered employee or everyone.
#[instrument(skip(store, caller), fields(caller = caller.employee_id))]
pub async fn monthly_summary<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    month: u32,
    year: i32,
    employee_id: Option<u64>,
) -> AppResult<MonthlySummary> {
    if !(1..=12).contains(&month) {
        return Err(AppError::InvalidRange(format!("month {month} is not in 1..=12")));
    }
    let employee_id = caller.scope(employee_id)?;

    let query = AttendanceQuery {
        employee_id,
        year: Some(year),
        month: Some(month),
        ..Default::default()
    };
    let (records, _) = store.list_attendance(&query, None).await?;

    Ok(MonthlySummary::tally(month, year, &records))
}

/// Admin-entered record, e.g. marking someone absent or on leave.
#[derive(Debug, Clone)]
pub struct ManualAttendance {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
}

#[instrument(skip(store, policy, caller, entry), fields(employee_id = entry.employee_id, date = %entry.date))]
pub async fn create_record<S: HrStore>(
    store: &S,
    policy: &HrPolicy,
    caller: &AuthUser,
    entry: ManualAttendance,
) -> AppResult<Attendance> {
    caller.require_admin()?;

    if store.employee(entry.employee_id).await?.is_none() {
        return Err(AppError::NotFound("Employee"));
    }

    let (work_hours, extra_hours) = match (entry.check_in, entry.check_out) {
        (Some(check_in), Some(check_out)) => {
            let (work, extra) =
                worked_hours(check_in, check_out, policy.standard_work_hours)?.formatted();
            (Some(work), Some(extra))
        }
        (None, Some(_)) => {
            warn!("Check-out given without check-in");
            return Err(AppError::NoCheckInFound);
        }
        _ => (None, None),
    };

    let record = store
        .insert_attendance(NewAttendance {
            employee_id: entry.employee_id,
            date: entry.date,
            check_in: entry.check_in,
            check_out: entry.check_out,
            work_hours,
            extra_hours,
            status: entry.status,
        })
        .await?;

    info!(attendance_id = record.id, admin = caller.employee_id, "Attendance recorded");
    Ok(record)
}

pub async fn list<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    mut query: AttendanceQuery,
    page: Page,
) -> AppResult<(Vec<Attendance>, i64)> {
    query.employee_id = caller.scope(query.employee_id)?;
    store.list_attendance(&query, Some(page)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::auth::testing::{admin, employee};
    use crate::model::employee::NewEmployee;
    use crate::model::role::Role;
    use crate::store::memory::MemoryStore;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn t(time: &str) -> NaiveTime {
        NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap()
    }

    fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    async fn seed(store: &MemoryStore, username: &str) -> u64 {
        store
            .insert_employee(NewEmployee {
                username: username.into(),
                email: format!("{username}@example.com"),
                role: Role::Employee,
                department: None,
                designation: None,
                joining_date: None,
                paid_leave_balance: 24,
                sick_leave_balance: 12,
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn nine_hour_day_has_one_extra_hour() {
        let hours = worked_hours(t("09:00:00"), t("18:00:00"), Decimal::from(8)).unwrap();
        assert_eq!(hours.formatted(), ("9.00".to_string(), "1.00".to_string()));
    }

    #[test]
    fn short_day_has_no_extra_hours() {
        let hours = worked_hours(t("09:00:00"), t("13:20:00"), Decimal::from(8)).unwrap();
        assert_eq!(hours.formatted(), ("4.33".to_string(), "0.00".to_string()));
    }

    #[test]
    fn overnight_span_is_rejected() {
        assert!(matches!(
            worked_hours(t("22:00:00"), t("02:00:00"), Decimal::from(8)),
            Err(AppError::CheckOutBeforeCheckIn)
        ));
    }

    #[actix_web::test]
    async fn check_in_then_out_records_hours() {
        let store = MemoryStore::new();
        let id = seed(&store, "asha").await;
        let me = employee(id);
        let policy = HrPolicy::default();

        let record = check_in(&store, &me, at("2024-03-04", "09:00:00")).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.check_in, Some(t("09:00:00")));
        assert_eq!(record.check_out, None);

        let record = check_out(&store, &policy, &me, at("2024-03-04", "18:00:00"))
            .await
            .unwrap();
        assert_eq!(record.check_out, Some(t("18:00:00")));
        assert_eq!(record.work_hours.as_deref(), Some("9.00"));
        assert_eq!(record.extra_hours.as_deref(), Some("1.00"));
    }

    #[actix_web::test]
    async fn second_check_in_same_day_fails() {
        let store = MemoryStore::new();
        let me = employee(seed(&store, "asha").await);

        check_in(&store, &me, at("2024-03-04", "09:00:00")).await.unwrap();
        let err = check_in(&store, &me, at("2024-03-04", "09:05:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedIn));

        // next day is a fresh record
        assert!(check_in(&store, &me, at("2024-03-05", "09:00:00")).await.is_ok());
    }

    #[actix_web::test]
    async fn check_in_for_unknown_employee_is_not_found() {
        let store = MemoryStore::new();

        let err = check_in(&store, &employee(4242), at("2024-03-04", "09:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Employee")));
        assert!(store.attendance_on(4242, day("2024-03-04")).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn check_out_without_check_in_fails() {
        let store = MemoryStore::new();
        let me = employee(seed(&store, "asha").await);

        let err = check_out(&store, &HrPolicy::default(), &me, at("2024-03-04", "18:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoCheckInFound));
    }

    #[actix_web::test]
    async fn yesterdays_check_in_does_not_count_today() {
        let store = MemoryStore::new();
        let me = employee(seed(&store, "asha").await);

        check_in(&store, &me, at("2024-03-04", "22:00:00")).await.unwrap();
        let err = check_out(&store, &HrPolicy::default(), &me, at("2024-03-05", "02:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoCheckInFound));
    }

    #[actix_web::test]
    async fn second_check_out_fails_and_keeps_first() {
        let store = MemoryStore::new();
        let me = employee(seed(&store, "asha").await);
        let policy = HrPolicy::default();

        check_in(&store, &me, at("2024-03-04", "09:00:00")).await.unwrap();
        check_out(&store, &policy, &me, at("2024-03-04", "17:00:00"))
            .await
            .unwrap();
        let err = check_out(&store, &policy, &me, at("2024-03-04", "19:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedOut));

        let record = store.attendance_on(me.employee_id, day("2024-03-04")).await.unwrap().unwrap();
        assert_eq!(record.work_hours.as_deref(), Some("8.00"));
        assert_eq!(record.extra_hours.as_deref(), Some("0.00"));
    }

    #[actix_web::test]
    async fn admin_created_record_without_check_in_cannot_be_checked_out() {
        let store = MemoryStore::new();
        let id = seed(&store, "asha").await;
        let policy = HrPolicy::default();

        create_record(
            &store,
            &policy,
            &admin(99),
            ManualAttendance {
                employee_id: id,
                date: day("2024-03-04"),
                check_in: None,
                check_out: None,
                status: AttendanceStatus::Absent,
            },
        )
        .await
        .unwrap();

        let err = check_out(&store, &policy, &employee(id), at("2024-03-04", "18:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoCheckInFound));
    }

    #[actix_web::test]
    async fn create_record_checks_role_duplicates_and_employee() {
        let store = MemoryStore::new();
        let id = seed(&store, "asha").await;
        let policy = HrPolicy::default();
        let entry = ManualAttendance {
            employee_id: id,
            date: day("2024-03-04"),
            check_in: Some(t("08:30:00")),
            check_out: Some(t("18:00:00")),
            status: AttendanceStatus::Present,
        };

        let err = create_record(&store, &policy, &employee(id), entry.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let record = create_record(&store, &policy, &admin(99), entry.clone())
            .await
            .unwrap();
        assert_eq!(record.work_hours.as_deref(), Some("9.50"));
        assert_eq!(record.extra_hours.as_deref(), Some("1.50"));

        let err = create_record(&store, &policy, &admin(99), entry.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateAttendance));

        let err = create_record(
            &store,
            &policy,
            &admin(99),
            ManualAttendance {
                employee_id: 4242,
                ..entry
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn monthly_summary_counts_by_status_and_scope() {
        let store = MemoryStore::new();
        let a = seed(&store, "asha").await;
        let b = seed(&store, "bo").await;
        let policy = HrPolicy::default();
        let boss = admin(99);

        let entries = [
            (a, "2024-03-01", AttendanceStatus::Present),
            (a, "2024-03-02", AttendanceStatus::Absent),
            (a, "2024-03-03", AttendanceStatus::HalfDay),
            (a, "2024-04-01", AttendanceStatus::Present),
            (b, "2024-03-01", AttendanceStatus::Present),
            (b, "2024-03-02", AttendanceStatus::OnLeave),
        ];
        for (employee_id, date, status) in entries {
            create_record(
                &store,
                &policy,
                &boss,
                ManualAttendance {
                    employee_id,
                    date: day(date),
                    check_in: None,
                    check_out: None,
                    status,
                },
            )
            .await
            .unwrap();
        }

        let mine = monthly_summary(&store, &employee(a), 3, 2024, None).await.unwrap();
        assert_eq!(mine.total_days, 3);
        assert_eq!((mine.present, mine.absent, mine.half_day, mine.on_leave), (1, 1, 1, 0));

        let everyone = monthly_summary(&store, &boss, 3, 2024, None).await.unwrap();
        assert_eq!(everyone.total_days, 5);
        assert_eq!(everyone.present, 2);
        assert_eq!(everyone.on_leave, 1);

        let only_b = monthly_summary(&store, &boss, 3, 2024, Some(b)).await.unwrap();
        assert_eq!(only_b.total_days, 2);

        let err = monthly_summary(&store, &employee(a), 3, 2024, Some(b))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = monthly_summary(&store, &boss, 13, 2024, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRange(_)));
    }

    #[actix_web::test]
    async fn employees_list_only_their_own_records() {
        let store = MemoryStore::new();
        let a = seed(&store, "asha").await;
        let b = seed(&store, "bo").await;

        check_in(&store, &employee(a), at("2024-03-04", "09:00:00")).await.unwrap();
        check_in(&store, &employee(b), at("2024-03-04", "09:30:00")).await.unwrap();

        let (rows, total) = list(&store, &employee(a), AttendanceQuery::default(), Page::new(None, None))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].employee_id, a);

        let (_, total) = list(&store, &admin(99), AttendanceQuery::default(), Page::new(None, None))
            .await
            .unwrap();
        assert_eq!(total, 2);
    }
}
