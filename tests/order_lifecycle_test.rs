// ==========================================
// 订单生命周期集成测试
// ==========================================
// 职责: 验证创建/重算/更新/删除的库存、重量与编号行为
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod order_lifecycle_test {
    use chrono::{NaiveDate, NaiveDateTime};
    use gem_order_tracker::api::{ApiError, UpdateOrderRequest};
    use gem_order_tracker::config::{config_keys, StaticOrderPolicy};
    use gem_order_tracker::domain::material::StoneCatalogUpdate;
    use gem_order_tracker::domain::order::{NewOrder, OrderFilter, StoneUsage};
    use gem_order_tracker::domain::types::{OrderStatus, OrderType};
    use gem_order_tracker::engine::OrderError;

    use crate::test_helpers::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn set_final_weight(w: f64) -> UpdateOrderRequest {
        UpdateOrderRequest {
            final_weight: Some(w),
            ..UpdateOrderRequest::default()
        }
    }

    fn set_status(s: &str) -> UpdateOrderRequest {
        UpdateOrderRequest {
            status: Some(s.to_string()),
            ..UpdateOrderRequest::default()
        }
    }

    // ==========================================
    // 重量与库存
    // ==========================================

    #[test]
    fn test_create_order_weight_formula() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-100");
        let ruby = seed_stone(&state, "Ruby", 100, 0.5);
        let kraft = seed_paper(&state, "Kraft", 10, 50, 0.25);

        let order = state
            .order_api
            .create_order(
                order_request(&design.id, 10, &[(&ruby.id, 4)], &[(&kraft.id, 8)]),
                &operator(),
            )
            .unwrap();

        // (4 × 0.5 + 8 × 0.25) × 10
        assert_close(order.calculated_weight, 40.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_type, OrderType::Internal);
        assert_eq!(order.final_weight, None);
        assert_eq!(order.created_by, "operator01");

        let loaded = state.order_api.get_order(&order.id).unwrap();
        assert_eq!(loaded.stones_used, order.stones_used);
        assert_eq!(loaded.paper_used, order.paper_used);
    }

    #[test]
    fn test_stock_conservation_and_restoration() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-101");
        let ruby = seed_stone(&state, "Ruby", 20, 1.0);

        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[(&ruby.id, 7)], &[]), &operator())
            .unwrap();
        assert_eq!(stone_quantity(&state, &ruby.id), 13);

        state.order_api.delete_order(&order.id, &admin()).unwrap();
        assert_eq!(stone_quantity(&state, &ruby.id), 20);

        let err = state.order_api.get_order(&order.id).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_paper_rounding_example() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-102");
        let kraft = seed_paper(&state, "Kraft", 3, 50, 0.1);

        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[(&kraft.id, 120)]), &operator())
            .unwrap();
        assert_eq!(paper_rolls(&state, &kraft.id), 0);

        state.order_api.delete_order(&order.id, &admin()).unwrap();
        assert_eq!(paper_rolls(&state, &kraft.id), 3);
    }

    #[test]
    fn test_insufficient_stock_rejected_without_side_effects() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-103");
        let ruby = seed_stone(&state, "Ruby", 5, 1.0);
        let kraft = seed_paper(&state, "Kraft", 2, 10, 0.1);

        let err = state
            .order_api
            .create_order(
                order_request(&design.id, 1, &[(&ruby.id, 10)], &[(&kraft.id, 5)]),
                &operator(),
            )
            .unwrap_err();

        match err {
            ApiError::InsufficientStock {
                ref name,
                available,
                requested,
                ..
            } => {
                assert_eq!(name, "Ruby");
                assert_eq!(available, 5);
                assert_eq!(requested, 10);
            }
            other => panic!("Expected InsufficientStock, got {:?}", other),
        }

        assert_eq!(stone_quantity(&state, &ruby.id), 5);
        assert_eq!(paper_rolls(&state, &kraft.id), 2);
        assert!(state.order_api.list_orders(None, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_paper_shortage_reports_pieces() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-104");
        let kraft = seed_paper(&state, "Kraft", 3, 50, 0.1);

        let err = state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[(&kraft.id, 151)]), &operator())
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::InsufficientStock {
                available: 150,
                requested: 151,
                ..
            }
        ));
        assert_eq!(paper_rolls(&state, &kraft.id), 3);
    }

    #[test]
    fn test_duplicate_usage_lines_cannot_oversell() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-105");
        let ruby = seed_stone(&state, "Ruby", 5, 1.0);

        // 每行单独校验可过, 合计超出库存
        let err = state
            .order_api
            .create_order(
                order_request(&design.id, 1, &[(&ruby.id, 3), (&ruby.id, 3)], &[]),
                &operator(),
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_STOCK");
        assert_eq!(stone_quantity(&state, &ruby.id), 5);
        assert!(state.order_api.list_orders(None, None, None).unwrap().is_empty());
    }

    // ==========================================
    // 入参校验
    // ==========================================

    #[test]
    fn test_create_validation_errors() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-106");
        let ruby = seed_stone(&state, "Ruby", 5, 1.0);

        let mut bad_type = order_request(&design.id, 1, &[], &[]);
        bad_type.order_type = "wholesale".to_string();
        let err = state.order_api.create_order(bad_type, &operator()).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = state
            .order_api
            .create_order(order_request(&design.id, 0, &[], &[]), &operator())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = state
            .order_api
            .create_order(order_request("no-such-design", 1, &[], &[]), &operator())
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err = state
            .order_api
            .create_order(order_request(&design.id, 1, &[("no-such-stone", 1)], &[]), &operator())
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err = state
            .order_api
            .create_order(order_request(&design.id, 1, &[(&ruby.id, -1)], &[]), &operator())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(stone_quantity(&state, &ruby.id), 5);
    }

    // ==========================================
    // 订单编号
    // ==========================================

    #[test]
    fn test_order_number_format_and_daily_reset() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-200");
        let (manager, _conn) = create_lifecycle(&state.db_path, StaticOrderPolicy::default());

        let input = NewOrder {
            design_id: design.id.clone(),
            order_type: OrderType::Out,
            quantity: 1,
            stones_used: vec![],
            paper_used: vec![],
            notes: None,
        };

        let first = manager.create_order_at(&input, &operator(), at(2024, 3, 5, 9)).unwrap();
        let second = manager.create_order_at(&input, &operator(), at(2024, 3, 5, 15)).unwrap();
        let next_day = manager.create_order_at(&input, &operator(), at(2024, 3, 6, 8)).unwrap();

        assert_eq!(first.order_number, "ORD-20240305-001");
        assert_eq!(second.order_number, "ORD-20240305-002");
        assert_eq!(next_day.order_number, "ORD-20240306-001");
    }

    #[test]
    fn test_order_number_not_reused_after_delete() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-201");
        let (manager, _conn) = create_lifecycle(&state.db_path, StaticOrderPolicy::default());
        let input = NewOrder {
            design_id: design.id.clone(),
            order_type: OrderType::Internal,
            quantity: 1,
            stones_used: vec![],
            paper_used: vec![],
            notes: None,
        };

        manager.create_order_at(&input, &operator(), at(2024, 3, 5, 9)).unwrap();
        let second = manager.create_order_at(&input, &operator(), at(2024, 3, 5, 10)).unwrap();
        manager.delete_order(&second.id, &admin()).unwrap();

        let third = manager.create_order_at(&input, &operator(), at(2024, 3, 5, 11)).unwrap();
        assert_eq!(third.order_number, "ORD-20240305-003");
    }

    #[test]
    fn test_order_number_prefix_from_config() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-202");
        state
            .config_manager
            .set_global_config_value(config_keys::ORDER_NUMBER_PREFIX, "GEM")
            .unwrap();
        state
            .config_manager
            .set_global_config_value(config_keys::ORDER_SEQ_WIDTH, "4")
            .unwrap();

        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[]), &operator())
            .unwrap();

        let parts: Vec<&str> = order.order_number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "GEM");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2], "0001");
    }

    // ==========================================
    // 实测重量与偏差
    // ==========================================

    #[test]
    fn test_weight_discrepancy() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-300");
        let ruby = seed_stone(&state, "Ruby", 100, 2.0);

        let order = state
            .order_api
            .create_order(order_request(&design.id, 10, &[(&ruby.id, 2)], &[]), &operator())
            .unwrap();
        assert_close(order.calculated_weight, 40.0);

        let order = state
            .order_api
            .update_order(&order.id, set_final_weight(45.0), &operator())
            .unwrap();
        assert_close(order.weight_discrepancy, 5.0);

        let order = state
            .order_api
            .update_order(&order.id, set_final_weight(38.0), &operator())
            .unwrap();
        assert_close(order.weight_discrepancy, -2.0);

        let reloaded = state.order_api.get_order(&order.id).unwrap();
        assert_eq!(reloaded.final_weight, Some(38.0));
        assert_close(reloaded.weight_discrepancy, -2.0);
    }

    #[test]
    fn test_negative_final_weight_rejected() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-301");
        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[]), &operator())
            .unwrap();

        let err = state
            .order_api
            .update_order(&order.id, set_final_weight(-1.0), &operator())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    // ==========================================
    // 重量重算
    // ==========================================

    #[test]
    fn test_recalculate_after_catalog_weight_change() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-400");
        let ruby = seed_stone(&state, "Ruby", 100, 2.0);

        let order = state
            .order_api
            .create_order(order_request(&design.id, 10, &[(&ruby.id, 2)], &[]), &operator())
            .unwrap();
        state
            .order_api
            .update_order(&order.id, set_final_weight(45.0), &operator())
            .unwrap();

        state
            .inventory_api
            .update_stone_catalog(
                &ruby.id,
                StoneCatalogUpdate {
                    name: "Ruby".to_string(),
                    unit: None,
                    weight_per_piece: Some(2.5),
                    description: None,
                },
                &admin(),
            )
            .unwrap();

        let resp = state
            .order_api
            .recalculate_order_weight(&order.id, &operator())
            .unwrap();

        // 2 × 2.5 × 10
        assert_close(resp.order.calculated_weight, 50.0);
        assert_close(resp.weight_breakdown.weight_per_piece, 5.0);
        assert_close(resp.weight_breakdown.stone_weight, 5.0);
        assert_close(resp.weight_breakdown.paper_weight, 0.0);
        assert_close(resp.order.weight_discrepancy, -5.0);

        // 重算不触碰库存
        assert_eq!(stone_quantity(&state, &ruby.id), 98);
    }

    #[test]
    fn test_recalculate_without_final_weight_keeps_discrepancy() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-401");
        let ruby = seed_stone(&state, "Ruby", 100, 1.0);

        let order = state
            .order_api
            .create_order(order_request(&design.id, 3, &[(&ruby.id, 1)], &[]), &operator())
            .unwrap();
        let resp = state
            .order_api
            .recalculate_order_weight(&order.id, &operator())
            .unwrap();

        assert_close(resp.order.calculated_weight, 3.0);
        assert_eq!(resp.order.final_weight, None);
        assert_close(resp.order.weight_discrepancy, 0.0);
    }

    #[test]
    fn test_batch_recalculation_counts() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-402");
        let ruby = seed_stone(&state, "Ruby", 10, 1.0);
        let onyx = seed_stone(&state, "Onyx", 2, 1.0);

        // 有效订单
        state
            .order_api
            .create_order(order_request(&design.id, 2, &[(&ruby.id, 1)], &[]), &operator())
            .unwrap();
        // 无 BOM
        state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[]), &operator())
            .unwrap();
        // 物料被删除后计算重量为 0
        state
            .order_api
            .create_order(order_request(&design.id, 1, &[(&onyx.id, 2)], &[]), &operator())
            .unwrap();
        state.inventory_api.delete_stone(&onyx.id, &admin()).unwrap();

        let summary = state
            .order_api
            .recalculate_all_order_weights(&admin())
            .unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.errors, 0);
    }

    // ==========================================
    // 状态更新
    // ==========================================

    #[test]
    fn test_permissive_status_transitions() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-500");
        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[]), &operator())
            .unwrap();

        for s in ["completed", "pending", "cancelled", "in_progress"] {
            let updated = state
                .order_api
                .update_order(&order.id, set_status(s), &operator())
                .unwrap();
            assert_eq!(updated.status.to_db_str(), s);
        }

        let err = state
            .order_api
            .update_order(&order.id, set_status("shipped"), &operator())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_workflow_mode_from_config() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-501");
        state
            .config_manager
            .set_global_config_value(config_keys::STATUS_TRANSITION_MODE, "WORKFLOW")
            .unwrap();

        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[]), &operator())
            .unwrap();

        let err = state
            .order_api
            .update_order(&order.id, set_status("completed"), &operator())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE_TRANSITION");

        state
            .order_api
            .update_order(&order.id, set_status("in_progress"), &operator())
            .unwrap();
        state
            .order_api
            .update_order(&order.id, set_status("completed"), &operator())
            .unwrap();

        let err = state
            .order_api
            .update_order(&order.id, set_status("cancelled"), &operator())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_cancel_does_not_restore_inventory() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-502");
        let ruby = seed_stone(&state, "Ruby", 10, 1.0);

        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[(&ruby.id, 4)], &[]), &operator())
            .unwrap();
        state
            .order_api
            .update_order(&order.id, set_status("cancelled"), &operator())
            .unwrap();

        assert_eq!(stone_quantity(&state, &ruby.id), 6);
    }

    #[test]
    fn test_notes_update_and_clear() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-503");
        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[]), &operator())
            .unwrap();

        let updated = state
            .order_api
            .update_order(
                &order.id,
                UpdateOrderRequest {
                    notes: Some(Some("rush".to_string())),
                    ..UpdateOrderRequest::default()
                },
                &operator(),
            )
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("rush"));
        assert_eq!(updated.status, OrderStatus::Pending);

        let cleared = state
            .order_api
            .update_order(
                &order.id,
                UpdateOrderRequest {
                    notes: Some(None),
                    ..UpdateOrderRequest::default()
                },
                &operator(),
            )
            .unwrap();
        assert_eq!(cleared.notes, None);
    }

    // ==========================================
    // 删除权限
    // ==========================================

    #[test]
    fn test_delete_requires_admin() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-600");
        let ruby = seed_stone(&state, "Ruby", 10, 1.0);
        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[(&ruby.id, 3)], &[]), &operator())
            .unwrap();

        let err = state.order_api.delete_order(&order.id, &operator()).unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert_eq!(stone_quantity(&state, &ruby.id), 7);
        assert!(state.order_api.get_order(&order.id).is_ok());

        let err = state.order_api.delete_order("no-such-order", &admin()).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    // ==========================================
    // 查询与审计
    // ==========================================

    #[test]
    fn test_list_orders_filters_newest_first() {
        let (_tmp, state) = create_test_state();
        let d1 = seed_design(&state, "D-700");
        let d2 = seed_design(&state, "D-701");
        let (manager, _conn) = create_lifecycle(&state.db_path, StaticOrderPolicy::default());

        let mk = |design_id: &str, order_type| NewOrder {
            design_id: design_id.to_string(),
            order_type,
            quantity: 1,
            stones_used: vec![],
            paper_used: vec![],
            notes: None,
        };

        let a = manager
            .create_order_at(&mk(&d1.id, OrderType::Internal), &operator(), at(2024, 3, 5, 9))
            .unwrap();
        let b = manager
            .create_order_at(&mk(&d2.id, OrderType::Out), &operator(), at(2024, 3, 5, 10))
            .unwrap();
        let c = manager
            .create_order_at(&mk(&d1.id, OrderType::Out), &operator(), at(2024, 3, 6, 9))
            .unwrap();

        let all = manager.list_orders(&OrderFilter::default()).unwrap();
        let ids: Vec<&str> = all.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec![c.id.as_str(), b.id.as_str(), a.id.as_str()]);

        let outs = state.order_api.list_orders(None, Some("out"), None).unwrap();
        assert_eq!(outs.len(), 2);

        let d1_orders = state.order_api.list_orders(None, None, Some(&d1.id)).unwrap();
        assert_eq!(d1_orders.len(), 2);
        assert_eq!(d1_orders[0].id, c.id);

        let pending = state.order_api.list_orders(Some("pending"), Some("out"), Some(&d2.id)).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);

        let err = state.order_api.list_orders(Some("bogus"), None, None).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_order_history_is_recorded() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-800");
        let order = state
            .order_api
            .create_order(order_request(&design.id, 1, &[], &[]), &operator())
            .unwrap();
        state
            .order_api
            .update_order(&order.id, set_final_weight(1.0), &operator())
            .unwrap();
        state.order_api.delete_order(&order.id, &admin()).unwrap();

        let history = state.order_api.get_order_history(&order.id).unwrap();
        let mut types: Vec<&str> = history.iter().map(|l| l.action_type.as_str()).collect();
        types.sort();
        assert_eq!(types, vec!["CREATE_ORDER", "DELETE_ORDER", "UPDATE_ORDER"]);
        assert!(history.iter().any(|l| l.actor == "admin01"));
    }

    #[test]
    fn test_engine_error_kinds_are_structured() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-900");
        let (manager, _conn) = create_lifecycle(&state.db_path, StaticOrderPolicy::default());

        let input = NewOrder {
            design_id: design.id.clone(),
            order_type: OrderType::Internal,
            quantity: 1,
            stones_used: vec![StoneUsage {
                stone_id: "missing-stone".to_string(),
                quantity: 1,
            }],
            paper_used: vec![],
            notes: None,
        };

        match manager.create_order_at(&input, &operator(), at(2024, 3, 5, 9)) {
            Err(OrderError::NotFound { entity, id }) => {
                assert_eq!(entity, "Stone");
                assert_eq!(id, "missing-stone");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_api_not_found_carries_entity_and_id() {
        let (_tmp, state) = create_test_state();

        match state.order_api.get_order("ghost-order") {
            Err(ApiError::NotFound { entity, id }) => {
                assert_eq!(entity, "Order");
                assert_eq!(id, "ghost-order");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let err = state
            .order_api
            .create_order(order_request("ghost-design", 1, &[], &[]), &operator())
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        match err {
            ApiError::NotFound { entity, id } => {
                assert_eq!(entity, "Design");
                assert_eq!(id, "ghost-design");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_enum_values_are_validation_errors() {
        let (_tmp, state) = create_test_state();
        let design = seed_design(&state, "D-901");

        let mut request = order_request(&design.id, 1, &[], &[]);
        request.order_type = "consignment".to_string();
        let err = state.order_api.create_order(request, &operator()).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err = state.order_api.list_orders(None, Some("retail"), None).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert!(state.order_api.list_orders(None, None, None).unwrap().is_empty());
    }
}
