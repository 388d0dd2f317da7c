//! Concurrency test: many clients against one route table while it is
//! being replaced.

use std::time::Duration;

use axum::http::StatusCode;
use trie_router::config::parse_config;

mod common;

fn routes(version: u32) -> String {
    let mut toml = String::new();
    for i in 0..50 {
        toml.push_str(&format!(
            "[[routes]]\nname = \"r{i}\"\npath = \"/api/v1/items{i}/:id\"\nbody = \"v{version} {{id}}\"\n\n"
        ));
    }
    toml
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_during_reloads() {
    let server = common::start_server(&routes(1)).await;
    let client = common::client();

    let reloader = {
        let updates = server.config_updates.clone();
        tokio::spawn(async move {
            for version in 2..=5 {
                tokio::time::sleep(Duration::from_millis(20)).await;
                updates.send(parse_config(&routes(version)).unwrap()).unwrap();
            }
        })
    };

    let mut tasks = Vec::new();
    for worker in 0..20 {
        let client = client.clone();
        let base = server.url("");
        tasks.push(tokio::spawn(async move {
            for n in 0..25 {
                let i = (worker * 25 + n) % 50;
                let res = client
                    .get(format!("{base}/api/v1/items{i}/{n}"))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(res.status(), StatusCode::OK);

                let body = res.text().await.unwrap();
                let (version, id) = body.split_once(' ').unwrap();
                assert!(version.starts_with('v'), "{body}");
                assert_eq!(id, n.to_string());
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
    reloader.await.unwrap();

    server.shutdown.trigger();
}
