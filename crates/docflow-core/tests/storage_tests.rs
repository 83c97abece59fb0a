use docflow_core::{select_target_systems, Complexity, PipelineState, TargetSystem, WorkItemId};
use docflow_test_utils::{setup_test_orchestrator, SCENARIO_IDS};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_policy_file_targets_policy_system() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let systems =
            select_target_systems("policy_renewals_A101.csv", "Policy Renewals for Q1", &mut rng);
        assert!(systems.contains(&TargetSystem::Warehouse));
        assert!(systems.contains(&TargetSystem::Policy));
    }
}

#[test]
fn test_unmatched_file_gets_exactly_one_core_system() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let systems =
            select_target_systems("api_response_B200.json", "API Integration Data", &mut rng);
        assert_eq!(systems.len(), 2);
        assert_eq!(systems[0], TargetSystem::Warehouse);
        assert!(TargetSystem::CORE.contains(&systems[1]));
    }
}

#[test]
fn test_claims_keyword_in_subject_only() {
    let mut rng = StdRng::seed_from_u64(1);
    let systems = select_target_systems("march_report.pdf", "Claims Report for March", &mut rng);
    assert_eq!(systems, vec![TargetSystem::Warehouse, TargetSystem::Claims]);
}

#[tokio::test]
async fn test_storage_outcome_per_item() {
    let mut orchestrator = setup_test_orchestrator(21);
    let mut state = PipelineState::new();
    state.enqueue_all(SCENARIO_IDS);
    orchestrator.run_until_idle(&mut state).await.unwrap();

    let api = state.run(&WorkItemId::from(SCENARIO_IDS[1])).unwrap();
    assert_eq!(api.artifact.item.complexity, Complexity::High);
    assert_eq!(api.storage.target_systems.len(), 2);
    assert_eq!(api.storage.target_systems[0], TargetSystem::Warehouse);

    let policy = state.run(&WorkItemId::from(SCENARIO_IDS[0])).unwrap();
    assert!(policy.storage.target_systems.contains(&TargetSystem::Policy));
    assert_eq!(
        Some(policy.storage.total_records),
        policy.transformed.shape.record_count().map(u64::from)
    );

    for id in SCENARIO_IDS {
        let run = state.run(&WorkItemId::from(id)).unwrap();
        assert_eq!(
            run.storage.storage_results.len(),
            run.storage.target_systems.len()
        );
        assert_eq!(
            run.storage.overall_success,
            run.storage.storage_results.iter().all(|r| r.success)
        );
        assert_eq!(run.storage.bytes_stored, run.transformed.file_size);
    }

    let stats = orchestrator.stats();
    let bytes: u64 = SCENARIO_IDS
        .iter()
        .map(|id| state.run(&WorkItemId::from(*id)).unwrap().storage.bytes_stored)
        .sum();
    assert_eq!(stats.storage.bytes_stored, bytes);
    assert_eq!(stats.transformation.bytes_processed, bytes);
}
