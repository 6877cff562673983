//! Drive the router in-process with real HTTP.

use serde_json::{json, Value};
use telemdash_sim::{router, AppState, DeviceModel};

async fn spawn_device() -> String {
    let app = router(AppState::new(DeviceModel::new(Some(11)), false));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn status_then_commands() {
    let base = spawn_device().await;
    let client = reqwest::Client::new();

    let s1: Value = client.get(format!("{base}/status")).send().await.unwrap().json().await.unwrap();
    let s2: Value = client.get(format!("{base}/status")).send().await.unwrap().json().await.unwrap();
    assert_eq!(s1["sample_count"], json!(1));
    assert_eq!(s2["sample_count"], json!(2));
    for key in ["st", "uptime_s", "tmp1", "vin_mv", "current_a", "faults"] {
        assert!(s1.get(key).is_some(), "missing {key}");
    }

    let reply: Value = client
        .post(format!("{base}/command"))
        .json(&json!({"command": "inject_fault", "args": {"fault": "VOLT_HIGH", "duration": 4}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["ok"], json!(true));

    let s3: Value = client.get(format!("{base}/status")).send().await.unwrap().json().await.unwrap();
    assert!(s3["faults"].as_array().unwrap().contains(&json!("VOLT_HIGH")));

    // args may be omitted
    let reply: Value = client
        .post(format!("{base}/command"))
        .json(&json!({"command": "clear_faults"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["message"], json!("Faults cleared"));
}
