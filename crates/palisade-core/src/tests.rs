#[cfg(test)]
mod tests {
    use crate::asset::{AssetMap, AssetRecord, ChainUpdate};
    use crate::constants::METERS_PER_DEGREE;
    use crate::enums::*;
    use crate::error::CoreError;
    use crate::track::Track;
    use crate::types::{Identifier, Position};
    use crate::weapon::{WeaponCategory, WeaponRecord};
    use crate::zone::{GeoVertex, Zone, ZoneTypeMask};

    fn origin() -> Position {
        Position::from_lla(26.5, 56.2, 0.0)
    }

    fn square_zone() -> Zone {
        Zone::polygonal(
            "box",
            ZoneType::Mez,
            vec![
                GeoVertex::new(56.1, 26.4),
                GeoVertex::new(56.3, 26.4),
                GeoVertex::new(56.3, 26.6),
                GeoVertex::new(56.1, 26.6),
            ],
        )
        .unwrap()
    }

    fn weapon(unit: u32, index: u32) -> WeaponRecord {
        WeaponRecord {
            id: Identifier::new(unit, index),
            name: "launcher".to_string(),
            system_type: "SA-X".to_string(),
            category: WeaponCategory::SurfaceToAir { min_range_m: 0.0 },
            position: origin(),
            munitions: 4,
            fire_channels: 2,
            max_range_m: 40_000.0,
            munition_speed_mps: 1000.0,
            nominal_pk: 0.8,
            shot_doctrine: ShotDoctrine::Shoot2,
            zones: Vec::new(),
        }
    }

    /// root(1) -> mid(2) -> leaf(3), leaf owns weapon 3:1.
    fn three_level() -> AssetMap {
        let mut assets = AssetMap::new();
        assets.insert(AssetRecord::new(Identifier::unit(1), "root", origin()).with_max_assignments(4));
        assets.insert(AssetRecord::new(Identifier::unit(2), "mid", origin()).with_max_assignments(2));
        assets.insert(
            AssetRecord::new(Identifier::unit(3), "leaf", origin())
                .with_max_assignments(1)
                .with_weapon(weapon(3, 1)),
        );
        assets
            .add_direct_subordinate(Identifier::unit(1), Identifier::unit(2))
            .unwrap();
        assets
            .add_direct_subordinate(Identifier::unit(2), Identifier::unit(3))
            .unwrap();
        assets
    }

    // ---- Identifiers and positions ----

    #[test]
    fn test_identifier_ordering_is_lexicographic() {
        let mut ids = vec![
            Identifier::new(2, 0),
            Identifier::new(1, 5),
            Identifier::new(1, 2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![Identifier::new(1, 2), Identifier::new(1, 5), Identifier::new(2, 0)]
        );
        assert!(!Identifier::unit(0).is_valid());
        assert_eq!(Identifier::new(7, 3).to_string(), "7:3");
    }

    #[test]
    fn test_position_serde_keeps_ecef_consistent() {
        let pos = Position::from_lla(26.5, 56.2, 1500.0);
        let json = serde_json::to_string(&pos).unwrap();
        assert!(json.contains("lat_deg"), "serialized as geodetic: {json}");
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(pos, back);
        assert!((Position::from_ecef(back.ecef()).alt_m() - 1500.0).abs() < 1e-4);
    }

    #[test]
    fn test_position_ranges() {
        let a = origin();
        let b = a.moved(0.0, 10_000.0, 0.0);
        assert!((a.ground_range_to(&b) - 10_000.0).abs() < 1e-3);
        assert!((a.slant_range_to(&b) - 10_000.0).abs() < 100.0, "slant ≈ ground at short range");
        assert!(a.bearing_to(&b) < 1e-9 || a.bearing_to(&b) > std::f64::consts::TAU - 1e-9);
    }

    // ---- Tracks ----

    #[test]
    fn test_level_flight_stays_level() {
        let track = Track::with_enu_velocity(
            Identifier::new(9, 1),
            0.0,
            Position::from_lla(26.5, 56.2, 5000.0),
            0.0,
            250.0,
            0.0,
        );
        let later = track.extrapolated(100.0);
        assert_eq!(later.update_time, 100.0);
        assert!((later.position.alt_m() - 5000.0).abs() < 1e-6, "altitude drifted");
        let flown = track.position.ground_range_to(&later.position);
        assert!((flown - 25_000.0).abs() < 200.0, "flew {flown} m");
        assert!(later.position.lat_deg() > track.position.lat_deg());
        assert_eq!(track.update_time, 0.0, "source track untouched");
    }

    #[test]
    fn test_climb_rate_applied() {
        let track = Track::with_enu_velocity(Identifier::new(9, 1), 10.0, origin(), 100.0, 0.0, 20.0);
        assert!((track.vertical_speed() - 20.0).abs() < 1e-9);
        assert!((track.heading() - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        let later = track.extrapolated(20.0);
        assert!((later.position.alt_m() - 200.0).abs() < 1e-6);
    }

    // ---- Zones ----

    #[test]
    fn test_circular_zone_with_floor() {
        let zone = Zone::circular("ring", ZoneType::Mez, origin(), 10_000.0)
            .with_altitude_band(Some(2000.0), None);
        let inside_low = origin().moved(0.0, 5000.0, 1000.0);
        assert!(!zone.contains(&inside_low), "below floor");
        assert!((zone.distance_to(&inside_low) - 1000.0).abs() < 1e-6);
        let closest = zone.closest_point(&inside_low);
        assert!((closest.alt_m() - 2000.0).abs() < 1e-6);
        assert!(zone.contains(&inside_low.with_altitude(3000.0)));
    }

    #[test]
    fn test_circular_zone_outside() {
        let zone = Zone::circular("ring", ZoneType::Mez, origin(), 10_000.0);
        let far = origin().moved(1.0, 15_000.0, 0.0);
        assert!(!zone.contains(&far));
        assert!((zone.distance_to(&far) - 5000.0).abs() < 1.0);
        let closest = zone.closest_point(&far);
        assert!((origin().ground_range_to(&closest) - 10_000.0).abs() < 1.0);
    }

    #[test]
    fn test_dome_is_hemisphere() {
        let dome = Zone::dome("dome", ZoneType::Da, origin(), 10_000.0);
        let flat = Zone::circular("flat", ZoneType::Da, origin(), 10_000.0);
        let high = origin().moved(0.0, 5000.0, 9000.0);
        assert!(flat.contains(&high));
        assert!(!dome.contains(&high), "outside the dome surface");
        assert!(dome.contains(&origin().moved(0.0, 5000.0, 3000.0)));
        let on_surface = dome.closest_point(&high);
        assert!((origin().slant_range_to(&on_surface) - 10_000.0).abs() < 1.0);
    }

    #[test]
    fn test_polygon_zone_queries() {
        let zone = square_zone();
        assert!(zone.contains(&Position::from_lla(26.5, 56.2, 3000.0)));

        let east = Position::from_lla(26.5, 56.4, 0.0);
        assert!(!zone.contains(&east));
        let expected = 0.1 * METERS_PER_DEGREE * 26.5_f64.to_radians().cos();
        let d = zone.distance_to(&east);
        assert!((d - expected).abs() < 50.0, "distance {d} vs {expected}");

        let closest = zone.closest_point(&east);
        assert!((closest.lon_deg() - 56.3).abs() < 1e-3);
        assert!((closest.lat_deg() - 26.5).abs() < 1e-3);
    }

    #[test]
    fn test_polygon_projection_by_heading() {
        let zone = square_zone();
        let east = Position::from_lla(26.5, 56.4, 0.0);
        assert!(zone.is_projected_inside(&east, 1.5 * std::f64::consts::PI), "heading west");
        assert!(!zone.is_projected_inside(&east, 0.5 * std::f64::consts::PI), "heading east");
    }

    #[test]
    fn test_invalid_zones_rejected() {
        let err = Zone::polygonal("line", ZoneType::Aor, vec![GeoVertex::new(0.0, 0.0); 2]);
        assert!(matches!(err, Err(CoreError::InvalidZone { .. })));
        let zone = Zone::circular("inverted", ZoneType::Aor, origin(), 1000.0)
            .with_altitude_band(Some(500.0), Some(100.0));
        assert!(zone.validate().is_err());
    }

    #[test]
    fn test_zone_type_mask() {
        let zones = vec![
            Zone::circular("mez", ZoneType::Mez, origin(), 10_000.0),
            Zone::circular("da", ZoneType::Da, origin(), 2_000.0),
        ];
        let near = origin().moved(0.0, 1000.0, 0.0);
        let mask = ZoneTypeMask::containing(&zones, &near, ZoneType::Other);
        assert!(mask.contains(ZoneType::Mez) && mask.contains(ZoneType::Da));
        assert_eq!(mask.to_string(), "MEZ,DA");

        let none = ZoneTypeMask::containing(&[], &near, ZoneType::Other);
        assert_eq!(none, ZoneTypeMask::of(ZoneType::Other));
    }

    // ---- Hierarchy ----

    #[test]
    fn test_hierarchy_links() {
        let assets = three_level();
        let (root, mid, leaf) = (Identifier::unit(1), Identifier::unit(2), Identifier::unit(3));
        assert_eq!(assets.commander_of(leaf), Some(mid));
        assert!(assets.is_subordinate(root, leaf));
        assert!(!assets.is_subordinate(leaf, root));
        assert_eq!(assets.find_next_subordinate_in_chain(root, leaf), Some(mid));
        assert_eq!(assets.find_next_commander_in_chain(mid), Some(root));
        assert_eq!(assets.subtree(root), vec![root, mid, leaf]);
    }

    #[test]
    fn test_hierarchy_rejects_cycles_and_self() {
        let mut assets = three_level();
        let (root, leaf) = (Identifier::unit(1), Identifier::unit(3));
        assert_eq!(
            assets.add_direct_subordinate(leaf, root),
            Err(CoreError::CommandCycle {
                commander: leaf,
                sub: root
            })
        );
        assert_eq!(
            assets.add_direct_subordinate(root, root),
            Err(CoreError::SelfReference(root))
        );
        assert_eq!(
            assets.add_direct_subordinate(root, Identifier::unit(0)),
            Err(CoreError::InvalidIdentifier(Identifier::unit(0)))
        );
    }

    #[test]
    fn test_commander_need_not_exist() {
        let mut assets = three_level();
        let ghost = Identifier::unit(99);
        assets.set_direct_commander(Identifier::unit(1), ghost).unwrap();
        assert_eq!(assets.commander_of(Identifier::unit(1)), Some(ghost));
    }

    #[test]
    fn test_resubordination_detaches_old_commander() {
        let mut assets = three_level();
        let (root, mid, leaf) = (Identifier::unit(1), Identifier::unit(2), Identifier::unit(3));
        assets.add_direct_subordinate(root, leaf).unwrap();
        assert!(!assets.get(mid).unwrap().subordinates.contains(&leaf));
        assert_eq!(assets.commander_of(leaf), Some(root));
    }

    #[test]
    fn test_chain_reserve_and_release() {
        let mut assets = three_level();
        let weapon_id = Identifier::new(3, 1);
        assets
            .update_c2_chain_assigned_unit_status(
                Identifier::unit(1),
                weapon_id,
                ChainUpdate::Reserve { munitions: 2 },
            )
            .unwrap();
        assert_eq!(assets.get(Identifier::unit(1)).unwrap().open_assignments, 3);
        assert_eq!(assets.get(Identifier::unit(2)).unwrap().open_assignments, 1);
        let leaf = assets.get(Identifier::unit(3)).unwrap();
        assert_eq!(leaf.open_assignments, 0);
        assert!(!leaf.has_open_assignment_slot());
        assert!((leaf.workload() - 1.0).abs() < 1e-12);
        let (_, w) = assets.weapon(weapon_id).unwrap();
        assert_eq!((w.fire_channels, w.munitions), (1, 2));

        assets
            .update_c2_chain_assigned_unit_status(
                Identifier::unit(1),
                weapon_id,
                ChainUpdate::Release { munitions: 2 },
            )
            .unwrap();
        assert_eq!(assets.get(Identifier::unit(3)).unwrap().open_assignments, 1);
        let (_, w) = assets.weapon(weapon_id).unwrap();
        assert_eq!((w.fire_channels, w.munitions), (2, 4));
    }

    #[test]
    fn test_chain_reserve_is_all_or_nothing() {
        let mut assets = three_level();
        let weapon_id = Identifier::new(3, 1);
        let reserve = ChainUpdate::Reserve { munitions: 1 };
        assets
            .update_c2_chain_assigned_unit_status(Identifier::unit(1), weapon_id, reserve)
            .unwrap();

        // The leaf has one slot, now taken
        let err = assets
            .update_c2_chain_assigned_unit_status(Identifier::unit(1), weapon_id, reserve)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::ReadinessExhausted {
                asset: Identifier::unit(3),
                resource: "assignment slots",
            }
        );
        assert_eq!(assets.get(Identifier::unit(1)).unwrap().open_assignments, 3, "root untouched");
        let (_, w) = assets.weapon(weapon_id).unwrap();
        assert_eq!((w.fire_channels, w.munitions), (1, 3));

        // Not enough rounds for a salvo
        assets.get_mut(Identifier::unit(3)).unwrap().open_assignments = 1;
        let err = assets
            .update_c2_chain_assigned_unit_status(
                Identifier::unit(1),
                weapon_id,
                ChainUpdate::Reserve { munitions: 4 },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::ReadinessExhausted { resource: "munitions", .. }));
        let (_, w) = assets.weapon(weapon_id).unwrap();
        assert_eq!((w.fire_channels, w.munitions), (1, 3));
    }

    #[test]
    fn test_unlimited_capacity() {
        let asset = AssetRecord::new(Identifier::unit(5), "free", origin());
        assert!(asset.has_open_assignment_slot());
        assert_eq!(asset.workload(), 0.0);
        assert!(asset.is_stale(61.0, 60.0));
        assert!(!asset.is_stale(60.0, 60.0));
    }

    // ---- Enums ----

    #[test]
    fn test_status_codes_and_names() {
        for status in AssignmentStatus::ALL {
            assert_eq!(AssignmentStatus::try_from(status.code()), Ok(status));
            assert_eq!(status.name().parse::<AssignmentStatus>(), Ok(status));
        }
        assert_eq!(
            AssignmentStatus::try_from(18),
            Err(CoreError::InvalidStatusCode(18))
        );
        assert!("Exploded".parse::<AssignmentStatus>().is_err());
        assert_eq!(AssignmentStatus::Cantco.to_string(), "CANTCO");
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = AssignmentStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                AssignmentStatus::Kill,
                AssignmentStatus::Cancelled,
                AssignmentStatus::HavcoSuccess,
                AssignmentStatus::HavcoFailure,
                AssignmentStatus::Cantco,
            ]
        );
    }

    #[test]
    fn test_shot_doctrine() {
        assert_eq!(ShotDoctrine::Shoot2.shots_per_salvo(), 2);
        assert_eq!(ShotDoctrine::ShootLookShoot.shots_per_salvo(), 1);
        assert_eq!(ShotDoctrine::Shoot1.munitions_to_commit(), 1);
    }

    #[test]
    fn test_weapon_category_serde() {
        let json = serde_json::to_string(&weapon(3, 1)).unwrap();
        assert!(json.contains("\"category\":\"surface_to_air\""), "{json}");
        let back: WeaponRecord = serde_json::from_str(&json).unwrap();
        assert!(back.category.is_ground_based());
        assert_eq!(back.owner(), Identifier::unit(3));
    }
}
