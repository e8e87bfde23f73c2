//! End-to-end pipeline runs against a scripted provider.

mod common;

use serde_json::Value;
use std::fs;
use std::time::Duration;

use cloud_verify::probes::{ERROR_HANDLING, IAM_PERMISSIONS, MULTI_REGION_CONNECTIVITY};
use cloud_verify::{ProviderError, Stage, VerifyConfig};
use common::{harness, ScriptedCloud, ACCOUNT};

fn config(dir: &std::path::Path) -> VerifyConfig {
    VerifyConfig::default().with_report_dir(dir)
}

#[tokio::test]
async fn test_services_stage_fails_when_storage_is_denied() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = ScriptedCloud {
        buckets: Err(ProviderError::service("AccessDenied", "s3:ListAllMyBuckets")),
        ..Default::default()
    };
    let h = harness(cloud, config(dir.path()));

    assert!(!h.pipeline.run_stage(Stage::ServiceConnection).await);

    let output = h.output.contents();
    assert!(output.contains("❌ storage connection"));
    assert!(output.contains("✅ compute connection"));
    assert!(output.contains("2/3 checks passed"));
}

#[tokio::test]
async fn test_comprehensive_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(ScriptedCloud::default(), config(dir.path()));

    let aggregator = h.pipeline.comprehensive_run().await;
    assert!(aggregator.summary().unwrap().overall_success);

    let path = dir.path().join("aws_verification_report_20240702_080509.json");
    assert_eq!(aggregator.report_path(), Some(path.as_path()));

    let report: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let tests = report["tests"].as_array().unwrap();
    assert_eq!(tests.len(), 4);
    assert_eq!(tests[0]["test_name"], IAM_PERMISSIONS);
    assert_eq!(tests[0]["details"]["account_id"], ACCOUNT);
    assert_eq!(tests[0]["details"]["attached_policies_count"], 1);
    assert_eq!(tests[3]["test_name"], ERROR_HANDLING);
    assert_eq!(tests[3]["details"]["error_code"], "NoSuchBucket");
    assert_eq!(report["summary"]["success_rate"], "4/4");
    assert_eq!(report["summary"]["overall_success"], true);
}

#[tokio::test]
async fn test_partial_region_failure_still_passes() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = ScriptedCloud::default()
        .fail_region("eu-west-1", ProviderError::service("AuthFailure", "region disabled"))
        .fail_region("ap-southeast-1", ProviderError::Transport("timed out".to_string()));
    let h = harness(cloud, config(dir.path()));

    let aggregator = h.pipeline.comprehensive_run().await;

    let multi = aggregator
        .outcomes()
        .iter()
        .find(|o| o.test_name() == MULTI_REGION_CONNECTIVITY)
        .unwrap();
    assert!(multi.success());
    assert_eq!(multi.detail("tested_regions").unwrap(), 5);
    assert_eq!(multi.detail("successful_regions").unwrap(), 3);
    assert_eq!(multi.detail("success_rate").unwrap(), "3/5");
    let failed = multi.detail("failed_regions").unwrap();
    assert_eq!(failed["eu-west-1"], "AuthFailure: region disabled");
    assert!(failed["ap-southeast-1"].as_str().unwrap().contains("timed out"));

    let output = h.output.contents();
    assert!(output.contains("✅ us-west-2: 2 availability zones"));
    assert!(output.contains("❌ eu-west-1: AuthFailure: region disabled"));
}

#[tokio::test]
async fn test_region_lines_appear_while_another_region_hangs() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = ScriptedCloud::default()
        .hang_region("us-west-2")
        .fail_region("eu-west-1", ProviderError::service("AuthFailure", "region disabled"));
    let h = harness(cloud, config(dir.path()));

    let run = tokio::time::timeout(
        Duration::from_millis(500),
        h.pipeline.comprehensive_run(),
    )
    .await;
    assert!(run.is_err());

    let output = h.output.contents();
    assert!(output.contains("✅ ap-northeast-1: 2 availability zones"));
    assert!(output.contains("✅ us-east-1: 2 availability zones"));
    assert!(output.contains("✅ ap-southeast-1: 2 availability zones"));
    assert!(output.contains("❌ eu-west-1: AuthFailure: region disabled"));
    assert!(!output.contains("us-west-2:"));
}

#[tokio::test]
async fn test_all_regions_failing_fails_comprehensive() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = ScriptedCloud::default();
    let config = config(dir.path()).with_regions(vec!["eu-west-1".to_string()]);
    let cloud = cloud.fail_region("eu-west-1", ProviderError::Transport("no route".to_string()));
    let h = harness(cloud, config);

    assert!(!h.pipeline.run_stage(Stage::Comprehensive).await);
}

#[tokio::test]
async fn test_denied_policy_listing_is_not_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = ScriptedCloud {
        policies_denied: true,
        ..Default::default()
    };
    let h = harness(cloud, config(dir.path()));

    let aggregator = h.pipeline.comprehensive_run().await;

    let iam = &aggregator.outcomes()[0];
    assert!(iam.success());
    assert!(iam.detail("iam_access").is_some());
}

#[tokio::test]
async fn test_full_run_scoreboard_and_pauses() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        ScriptedCloud::default(),
        config(dir.path()).with_stage_delay_secs(7),
    );

    let scoreboard = h.pipeline.run_all().await;

    assert!(scoreboard.all_passed());
    assert_eq!(
        h.sleeper.sleeps(),
        vec![Duration::from_secs(7), Duration::from_secs(7)]
    );
    assert!(h.output.contents().contains("Overall: 3/3 stages passed"));
}

#[tokio::test]
async fn test_full_run_without_credentials_reports_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = ScriptedCloud {
        identity: Err(ProviderError::MissingCredentials(
            "Unable to locate credentials".to_string(),
        )),
        ..Default::default()
    };
    let h = harness(cloud, config(dir.path()));

    let scoreboard = h.pipeline.run_all().await;

    assert_eq!(scoreboard.total(), 3);
    assert_eq!(scoreboard.passed(Stage::BasicAuth), Some(false));
    assert_eq!(scoreboard.passed(Stage::Comprehensive), Some(false));
    // stage 2 does not need the identity, so only its pause happens
    assert_eq!(h.sleeper.sleeps().len(), 1);
    assert!(h.output.contents().contains("Continuing with the next stage"));
}
