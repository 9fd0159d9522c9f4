// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证订单策略配置读取的正确性
// ==========================================

mod test_helpers;

use gem_order_tracker::config::{config_keys, ConfigManager, OrderPolicyReader};
use gem_order_tracker::domain::types::StatusTransitionMode;
use test_helpers::create_test_db;

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_defaults_when_unset() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(config_manager.get_order_number_prefix().unwrap(), "ORD");
    assert_eq!(config_manager.get_order_seq_width().unwrap(), 3);
    assert_eq!(
        config_manager.get_status_transition_mode().unwrap(),
        StatusTransitionMode::Permissive
    );
}

#[test]
fn test_values_persist_across_managers() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    {
        let writer = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
        writer
            .set_global_config_value(config_keys::ORDER_NUMBER_PREFIX, "GEM")
            .unwrap();
        writer
            .set_global_config_value(config_keys::STATUS_TRANSITION_MODE, "workflow")
            .unwrap();
    }

    let reader = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    assert_eq!(reader.get_order_number_prefix().unwrap(), "GEM");
    assert_eq!(
        reader.get_status_transition_mode().unwrap(),
        StatusTransitionMode::Workflow
    );

    let snapshot = reader.get_config_snapshot().unwrap();
    assert!(snapshot.contains("GEM"));
}

#[test]
fn test_invalid_seq_width_reported() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::ORDER_SEQ_WIDTH, "three")
        .unwrap();
    assert!(config_manager.get_order_seq_width().is_err());
}
