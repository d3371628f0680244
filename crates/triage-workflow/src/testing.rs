//! 测试辅助

use crate::directory::{NewDoctor, NewHospital};
use crate::memory::InMemoryStore;
use crate::queue::{NewReceipt, TriageQueueManager};
use crate::state_machine::QueuePolicy;
use chrono::Utc;
use std::sync::Arc;
use triage_core::{Doctor, Receipt, ReceiptStatus};
use uuid::Uuid;

pub async fn setup() -> (TriageQueueManager, Uuid) {
    setup_with_policy(QueuePolicy::default()).await
}

pub async fn setup_with_policy(policy: QueuePolicy) -> (TriageQueueManager, Uuid) {
    let manager = TriageQueueManager::new(Arc::new(InMemoryStore::new()), policy);
    let hospital_id = hospital(&manager).await;
    (manager, hospital_id)
}

pub async fn hospital(manager: &TriageQueueManager) -> Uuid {
    manager
        .register_hospital(NewHospital {
            name: "St. Mary".to_string(),
            address: None,
            phone: None,
        })
        .await
        .unwrap()
        .id
}

pub async fn doctor(manager: &TriageQueueManager, hospital_id: Uuid, available: bool) -> Doctor {
    manager
        .register_doctor(NewDoctor {
            hospital_id,
            name: format!("Dr. {}", Uuid::new_v4().simple()),
            specialization: Some("emergency".to_string()),
            available,
        })
        .await
        .unwrap()
}

pub async fn submit(manager: &TriageQueueManager, hospital_id: Option<Uuid>) -> Receipt {
    manager
        .submit_receipt(NewReceipt {
            user_id: Uuid::new_v4(),
            image_url: "uploads/receipt.jpg".to_string(),
            condition: Some("chest pain".to_string()),
            severity: Some(4),
            hospital_id,
            ai_analysis: None,
        })
        .await
        .unwrap()
}

pub fn queued_receipt(hospital_id: Uuid, position: i32) -> Receipt {
    Receipt {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        image_url: "uploads/receipt.jpg".to_string(),
        uploaded_at: Utc::now(),
        processed_at: Some(Utc::now()),
        condition: None,
        severity: None,
        hospital_id: Some(hospital_id),
        doctor_id: None,
        status: ReceiptStatus::Queued,
        queue_position: Some(position),
        ai_analysis: None,
    }
}

/// 断言医院队列位置恰好为 1..n
pub async fn assert_dense(manager: &TriageQueueManager, hospital_id: Uuid) {
    let queue = manager.queue_snapshot(hospital_id).await.unwrap();
    let positions: Vec<i32> = queue.iter().filter_map(|r| r.queue_position).collect();
    let expected: Vec<i32> = (1..=queue.len() as i32).collect();
    assert_eq!(positions, expected);
}
