use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use hrm_leave_ledger::model::{
    employee::Employee,
    leave_request::LeaveRequest,
    leave_transaction::{Decision, LeaveStatus},
    leave_type::{GrantType, LeaveType},
    role::Role,
};
use hrm_leave_ledger::store::MemoryStore;
use hrm_leave_ledger::store::memory::FailPoint;
use hrm_leave_ledger::{
    EligibilityError, LedgerError, LeaveError, Outcome, StoreError, decide_leave, employee_balance,
    file_leave, grant_credit,
};

const ADMIN: u64 = 1;
const ALICE: u64 = 2;
const BOB: u64 = 3;
const VACATION: u64 = 1;

/// Monday 2026-03-02, 09:00.
fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn employee(id: u64, role: Role) -> Employee {
    Employee {
        id,
        employee_code: format!("EMP-{id:03}"),
        first_name: "Test".into(),
        last_name: format!("User{id}"),
        role,
    }
}

fn request(employee_id: u64, start: &str, end: &str) -> LeaveRequest {
    LeaveRequest {
        employee_id: Some(employee_id),
        leave_type_id: Some(VACATION),
        start_date: Some(start.into()),
        end_date: Some(end.into()),
        reason: Some("family trip".into()),
    }
}

/// Alice holds a single lot of 5 days.
async fn setup() -> MemoryStore {
    let store = MemoryStore::new();
    store.add_employee(employee(ADMIN, Role::Admin)).await;
    store.add_employee(employee(ALICE, Role::Employee)).await;
    store.add_employee(employee(BOB, Role::Employee)).await;
    store
        .add_leave_type(LeaveType {
            id: VACATION,
            name: "Vacation".into(),
            is_carried_over: true,
            notice_day: 3,
            rule_id: 1,
            base_value: Decimal::from(10),
            grant_type: GrantType::Default,
        })
        .await;

    grant_credit(&store, ALICE, None, Decimal::from(5), ADMIN, now())
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn approval_deducts_from_the_lot() {
    let store = setup().await;

    // Mon..Wed
    let leave = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-11"), ALICE, now())
        .await
        .unwrap();
    assert_eq!(leave.status, LeaveStatus::Pending);
    assert_eq!(leave.total_leave, Decimal::from(3));
    assert_eq!(leave.rewarded_by_id, None);
    assert_eq!(leave.year, 2026);

    // filing reserves nothing
    assert_eq!(employee_balance(&store, ALICE).await.unwrap(), Decimal::from(5));

    let decided = decide_leave(&store, leave.id, Decision::Approved, ADMIN)
        .await
        .unwrap();
    assert_eq!(decided.status, LeaveStatus::Approved);
    assert_eq!(decided.approved_by_id, Some(ADMIN));

    let lots = store.lots_of(ALICE).await;
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].latest_credit, Decimal::from(2));
    assert_eq!(lots[0].used_credit, Decimal::from(3));
    assert_eq!(lots[0].leave_transaction_id, Some(leave.id));
    assert!(lots[0].is_balanced());
    assert_eq!(store.leave(leave.id).await.unwrap().status, LeaveStatus::Approved);
}

#[tokio::test]
async fn filing_beyond_balance_creates_nothing() {
    let store = setup().await;
    let first = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-11"), ALICE, now())
        .await
        .unwrap();
    decide_leave(&store, first.id, Decision::Approved, ADMIN)
        .await
        .unwrap();

    // Mon..Fri with 2 days left
    let err = file_leave(&store, request(ALICE, "2026-03-16", "2026-03-20"), ALICE, now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LeaveError::InsufficientCredit {
            available: Decimal::from(2),
            required: Decimal::from(5),
        }
    );
    assert_eq!(store.leave_count().await, 1);
}

#[tokio::test]
async fn ineligible_filing_is_rejected_before_any_write() {
    let store = setup().await;

    let err = file_leave(&store, request(ALICE, "2026-03-04", "2026-03-06"), ALICE, now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LeaveError::Eligibility(EligibilityError::InsufficientNotice {
            required: 3,
            actual: 2
        })
    );

    let mut incomplete = request(ALICE, "2026-03-09", "2026-03-11");
    incomplete.reason = Some("  ".into());
    assert_eq!(
        file_leave(&store, incomplete, ALICE, now()).await.unwrap_err(),
        LeaveError::Eligibility(EligibilityError::MissingFields(vec!["reason"]))
    );
    assert_eq!(store.leave_count().await, 0);
}

#[tokio::test]
async fn decided_leave_cannot_be_decided_again() {
    let store = setup().await;
    let leave = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-11"), ALICE, now())
        .await
        .unwrap();

    decide_leave(&store, leave.id, Decision::Approved, ADMIN)
        .await
        .unwrap();
    for decision in [Decision::Approved, Decision::Rejected, Decision::Cancelled] {
        assert_eq!(
            decide_leave(&store, leave.id, decision, ADMIN).await.unwrap_err(),
            LeaveError::AlreadyDecided {
                id: leave.id,
                status: LeaveStatus::Approved
            }
        );
    }

    assert_eq!(employee_balance(&store, ALICE).await.unwrap(), Decimal::from(2));
}

#[tokio::test]
async fn rejection_and_cancellation_leave_credit_alone() {
    let store = setup().await;
    let first = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-10"), ALICE, now())
        .await
        .unwrap();
    let second = file_leave(&store, request(ALICE, "2026-03-16", "2026-03-17"), ALICE, now())
        .await
        .unwrap();

    let rejected = decide_leave(&store, first.id, Decision::Rejected, ADMIN)
        .await
        .unwrap();
    assert_eq!(rejected.status, LeaveStatus::Rejected);
    assert_eq!(rejected.approved_by_id, Some(ADMIN));

    // owners may withdraw their own request
    let cancelled = decide_leave(&store, second.id, Decision::Cancelled, ALICE)
        .await
        .unwrap();
    assert_eq!(cancelled.status, LeaveStatus::Cancelled);
    assert_eq!(cancelled.approved_by_id, None);

    assert_eq!(employee_balance(&store, ALICE).await.unwrap(), Decimal::from(5));
}

#[tokio::test]
async fn only_admins_decide_and_file_for_others() {
    let store = setup().await;
    let leave = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-11"), ALICE, now())
        .await
        .unwrap();

    for (decision, who) in [
        (Decision::Approved, ALICE),
        (Decision::Rejected, BOB),
        (Decision::Cancelled, BOB),
    ] {
        assert!(matches!(
            decide_leave(&store, leave.id, decision, who).await,
            Err(LeaveError::Unauthorized(_))
        ));
    }
    assert_eq!(store.leave(leave.id).await.unwrap().status, LeaveStatus::Pending);

    assert!(matches!(
        file_leave(&store, request(ALICE, "2026-03-16", "2026-03-17"), BOB, now()).await,
        Err(LeaveError::Unauthorized(_))
    ));

    let on_behalf = file_leave(&store, request(ALICE, "2026-03-16", "2026-03-17"), ADMIN, now())
        .await
        .unwrap();
    assert_eq!(on_behalf.employee_id, ALICE);
    assert_eq!(on_behalf.rewarded_by_id, Some(ADMIN));
}

#[tokio::test]
async fn failed_status_write_rolls_back_the_deduction() {
    let store = setup().await;
    let leave = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-11"), ALICE, now())
        .await
        .unwrap();

    store
        .fail_next(
            FailPoint::UpdateLeaveStatus,
            StoreError::Persistence("connection reset".into()),
        )
        .await;
    let err = decide_leave(&store, leave.id, Decision::Approved, ADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Persistence(_)));
    assert!(!err.is_retryable());

    let lots = store.lots_of(ALICE).await;
    assert_eq!(lots[0].latest_credit, Decimal::from(5));
    assert_eq!(lots[0].used_credit, Decimal::ZERO);
    assert_eq!(store.leave(leave.id).await.unwrap().status, LeaveStatus::Pending);

    // the failure was one-shot
    decide_leave(&store, leave.id, Decision::Approved, ADMIN)
        .await
        .unwrap();
    assert_eq!(employee_balance(&store, ALICE).await.unwrap(), Decimal::from(2));
}

#[tokio::test]
async fn lock_conflicts_surface_as_retryable() {
    let store = setup().await;
    let leave = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-11"), ALICE, now())
        .await
        .unwrap();

    store
        .fail_next(
            FailPoint::UpdateLot,
            StoreError::Conflict("Deadlock found when trying to get lock".into()),
        )
        .await;
    let result = decide_leave(&store, leave.id, Decision::Approved, ADMIN).await;

    let err = result.clone().unwrap_err();
    assert!(matches!(err, LeaveError::ConcurrencyConflict(_)));
    assert!(err.is_retryable());

    let outcome = Outcome::from_result(result, "Leave approved");
    assert!(!outcome.is_success());
    assert!(outcome.retryable);

    assert_eq!(store.leave(leave.id).await.unwrap().status, LeaveStatus::Pending);
    assert_eq!(employee_balance(&store, ALICE).await.unwrap(), Decimal::from(5));
}

#[tokio::test]
async fn approval_draws_on_the_newest_lot_only() {
    let store = setup().await;
    let later = NaiveDate::from_ymd_opt(2026, 3, 3)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    grant_credit(&store, ALICE, None, Decimal::from(2), ADMIN, later)
        .await
        .unwrap();

    let short = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-10"), ALICE, now())
        .await
        .unwrap();
    decide_leave(&store, short.id, Decision::Approved, ADMIN)
        .await
        .unwrap();

    let lots = store.lots_of(ALICE).await;
    let newest = lots.iter().find(|l| l.created_at == later).unwrap();
    let oldest = lots.iter().find(|l| l.created_at == now()).unwrap();
    assert_eq!(newest.latest_credit, Decimal::ZERO);
    assert_eq!(oldest.latest_credit, Decimal::from(5));

    // 3 days fit the balance but not the newest open lot alone
    let grant_later = NaiveDate::from_ymd_opt(2026, 3, 4)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    grant_credit(&store, ALICE, None, Decimal::ONE, ADMIN, grant_later)
        .await
        .unwrap();
    let long = file_leave(&store, request(ALICE, "2026-03-16", "2026-03-18"), ALICE, now())
        .await
        .unwrap();
    let err = decide_leave(&store, long.id, Decision::Approved, ADMIN)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LeaveError::Ledger(LedgerError::InsufficientLotBalance { .. })
    ));
    assert_eq!(employee_balance(&store, ALICE).await.unwrap(), Decimal::from(6));
    assert_eq!(store.leave(long.id).await.unwrap().status, LeaveStatus::Pending);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_approvals_cannot_overdraw() {
    let store = setup().await;
    let first = file_leave(&store, request(ALICE, "2026-03-09", "2026-03-11"), ALICE, now())
        .await
        .unwrap();
    let second = file_leave(&store, request(ALICE, "2026-03-16", "2026-03-18"), ALICE, now())
        .await
        .unwrap();

    let handles: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|leave_id| {
            let store = store.clone();
            tokio::spawn(async move {
                decide_leave(&store, leave_id, Decision::Approved, ADMIN).await
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let err = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(
        err,
        LeaveError::InsufficientCredit {
            available: Decimal::from(2),
            required: Decimal::from(3),
        }
    );

    assert_eq!(employee_balance(&store, ALICE).await.unwrap(), Decimal::from(2));
    let mut statuses = vec![
        store.leave(first.id).await.unwrap().status,
        store.leave(second.id).await.unwrap().status,
    ];
    statuses.sort_by_key(|s| s.to_string());
    assert_eq!(statuses, vec![LeaveStatus::Approved, LeaveStatus::Pending]);
}
