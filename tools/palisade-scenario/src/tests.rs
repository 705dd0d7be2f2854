#[cfg(test)]
mod tests {
    use palisade_core::enums::AssignmentStatus;
    use palisade_core::{Identifier, Position};
    use palisade_c2::Payload;
    use palisade_engage::AllocationStrategy;

    use crate::driver::{Driver, TickReport};
    use crate::scenario::Scenario;

    const LAYERED_DEFENSE: &str = include_str!("../scenarios/layered_defense.json");

    const COMMAND: Identifier = Identifier::unit(1);
    const BATTALION: Identifier = Identifier::unit(2);
    const BRAVO: Identifier = Identifier::unit(4);
    const ALPHA_SAM: Identifier = Identifier::new(3, 1);
    const BRAVO_SAM: Identifier = Identifier::new(4, 1);
    const FIGHTER: Identifier = Identifier::new(900, 1);
    const CRUISE_MISSILE: Identifier = Identifier::new(900, 2);
    const BALLOON: Identifier = Identifier::new(900, 3);
    const SECOND_MISSILE: Identifier = Identifier::new(900, 4);

    fn scenario() -> Scenario {
        Scenario::from_json(LAYERED_DEFENSE).unwrap()
    }

    fn weapon_for(report: &TickReport, track: Identifier) -> Option<Identifier> {
        report
            .committed
            .iter()
            .find(|m| m.reference_track_id == track)
            .map(|m| m.assigned_weapon)
    }

    // ---- Loading ----

    #[test]
    fn test_embedded_scenario_builds() {
        let scenario = scenario();
        assert_eq!(scenario.self_asset, COMMAND);
        let world = scenario.build().unwrap();
        assert_eq!(world.assets.len(), 5);
        assert_eq!(world.threats.len(), 3);
        assert_eq!(world.table.rows().len(), 3);

        let battalion = world.assets.get(BATTALION).unwrap();
        assert_eq!(
            battalion.subordinates.iter().copied().collect::<Vec<_>>(),
            vec![Identifier::unit(3), BRAVO],
            "subordinates linked from commander fields"
        );
        let missile = world.threats.iter().find(|t| t.id() == CRUISE_MISSILE).unwrap();
        assert!((missile.track.speed() - 220.0).abs() < 1e-6);
        assert_eq!(missile.track.target_type, "CRUISE_MISSILE");
    }

    #[test]
    fn test_rejects_misnumbered_weapon() {
        let mut scenario = scenario();
        scenario.assets[2].weapons[0].id = Identifier::new(9, 1);
        let err = scenario.build().unwrap_err();
        assert!(err.to_string().contains("not numbered under asset"), "got: {err}");
    }

    #[test]
    fn test_rejects_unknown_self_asset() {
        let mut scenario = scenario();
        scenario.self_asset = Identifier::unit(42);
        assert!(scenario.build().is_err());
    }

    #[test]
    fn test_rejects_duplicate_threat() {
        let mut scenario = scenario();
        let copy = scenario.threats[0].clone();
        scenario.threats.push(copy);
        let err = scenario.build().unwrap_err();
        assert!(err.to_string().contains("defined twice"), "got: {err}");
    }

    #[test]
    fn test_rejects_invalid_engagement_config() {
        let mut scenario = scenario();
        scenario.engagement.max_assignments_per_track = 0;
        assert!(scenario.build().is_err());
    }

    // ---- First tick ----

    #[test]
    fn test_first_tick_allocates_fastest_weapons() {
        let mut driver = Driver::new(scenario()).unwrap();
        let report = driver.tick(0.0).unwrap();

        assert_eq!(report.committed.len(), 2);
        assert_eq!(weapon_for(&report, FIGHTER), Some(ALPHA_SAM), "only Alpha reaches the raid");
        assert_eq!(
            weapon_for(&report, CRUISE_MISSILE),
            Some(BRAVO_SAM),
            "Bravo intercepts sooner than Alpha"
        );
        assert_eq!(report.unpreferred, vec![BALLOON]);
        assert!(report.committed.iter().all(|m| m.delegation));
        assert!(report.committed.iter().all(|m| m.assigning_unit == COMMAND));

        let threats = driver.threats();
        let fighter = threats.iter().find(|t| t.id() == FIGHTER).unwrap();
        assert_eq!(fighter.allocated_weapon, Some(ALPHA_SAM));
        assert!(threats.iter().find(|t| t.id() == BALLOON).unwrap().allocated_weapon.is_none());
        assert_eq!(driver.book().active().count(), 2);
    }

    #[test]
    fn test_assignments_relay_through_battalion() {
        let mut driver = Driver::new(scenario()).unwrap();
        let report = driver.tick(0.0).unwrap();

        // Two assignments and two track assignment updates, all via the battalion
        assert_eq!(report.envelopes.len(), 4);
        for envelope in &report.envelopes {
            assert_eq!(envelope.sender, COMMAND);
            assert_eq!(envelope.destination, BATTALION, "relayed through the battalion");
            assert!(!envelope.broadcast);
        }
        let assignments = report
            .envelopes
            .iter()
            .filter(|e| matches!(e.payload, Payload::Assignment(_)))
            .count();
        assert_eq!(assignments, 2);
    }

    #[test]
    fn test_engaged_threats_are_not_reassigned() {
        let mut driver = Driver::new(scenario()).unwrap();
        driver.tick(0.0).unwrap();
        let second = driver.tick(1.0).unwrap();
        assert!(second.committed.is_empty(), "one assignment per track");
        assert!(second.cancelled.is_empty());
        assert_eq!(driver.book().active().count(), 2);
    }

    #[test]
    fn test_optimal_strategy_matches_on_this_raid() {
        let mut scenario = scenario();
        scenario.engagement.strategy = AllocationStrategy::Optimal;
        let mut driver = Driver::new(scenario).unwrap();
        let report = driver.tick(0.0).unwrap();
        assert_eq!(weapon_for(&report, FIGHTER), Some(ALPHA_SAM));
        assert_eq!(weapon_for(&report, CRUISE_MISSILE), Some(BRAVO_SAM));
        assert!(weapon_for(&report, BALLOON).is_none());
    }

    #[test]
    fn test_weapon_is_not_committed_past_its_channels() {
        let mut scenario = scenario();
        let mut second = scenario.threats[1].clone();
        second.id = SECOND_MISSILE;
        second.position = Position::from_lla(33.32, 44.4, 100.0);
        scenario.threats.push(second);
        let mut driver = Driver::new(scenario).unwrap();

        // Both missiles reach Bravo first, but it has a single fire channel
        let report = driver.tick(0.0).unwrap();
        let on_bravo: Vec<Identifier> = report
            .committed
            .iter()
            .filter(|m| m.assigned_weapon == BRAVO_SAM)
            .map(|m| m.reference_track_id)
            .collect();
        assert_eq!(on_bravo.len(), 1);
        let leftover = if on_bravo[0] == CRUISE_MISSILE {
            SECOND_MISSILE
        } else {
            CRUISE_MISSILE
        };
        assert!(report.unallocated.contains(&leftover));
        let threat = driver.threats().iter().find(|t| t.id() == leftover).unwrap();
        assert!(threat.allocated_weapon.is_none());

        let next = driver.tick(1.0).unwrap();
        assert_eq!(weapon_for(&next, leftover), Some(ALPHA_SAM), "Alpha picks it up");
    }

    // ---- Weapon play and monitors ----

    #[test]
    fn test_weapon_lifecycle_is_reported_upward() {
        let mut driver = Driver::new(scenario()).unwrap();
        let reports = driver.run(6, 5.0).unwrap();
        assert_eq!(reports[4].time, 20.0);

        let status_of = |report: &TickReport, sender: Identifier| -> Vec<AssignmentStatus> {
            report
                .envelopes
                .iter()
                .filter(|e| e.sender == sender)
                .filter_map(|e| match &e.payload {
                    Payload::AssignmentStatus(m) => Some(m.status.status),
                    _ => None,
                })
                .collect()
        };

        // Acknowledge on the next tick, fire once the launch delays are over
        assert_eq!(status_of(&reports[1], BRAVO), vec![AssignmentStatus::Wilco]);
        assert_eq!(status_of(&reports[2], BRAVO), vec![AssignmentStatus::Firing]);
        for envelope in reports[1].envelopes.iter().filter(|e| e.sender == BRAVO) {
            assert_eq!(envelope.destination, BATTALION);
        }

        // The cruise missile intercept completes at about 18 s
        let outcome = status_of(&reports[4], BRAVO);
        assert_eq!(outcome.len(), 1);
        assert!(matches!(
            outcome[0],
            AssignmentStatus::Kill | AssignmentStatus::HavcoFailure
        ));
    }

    #[test]
    fn test_silent_battery_assignment_is_cancelled() {
        let mut scenario = scenario();
        scenario.simulate_weapons = false;
        scenario.silent_assets = vec![BRAVO];
        let mut driver = Driver::new(scenario).unwrap();
        let reports = driver.run(8, 10.0).unwrap();

        for report in &reports[..7] {
            assert!(report.cancelled.is_empty(), "nothing stale at t={}", report.time);
        }
        let last = &reports[7];
        assert_eq!(last.time, 70.0);
        let cancelled = last
            .cancelled
            .iter()
            .find(|m| m.assigned_weapon == BRAVO_SAM)
            .unwrap();
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("assigned unit stale"));
        assert!(last.envelopes.iter().any(|e| matches!(
            &e.payload,
            Payload::AssignmentCancel(m) if m.assigned_weapon == BRAVO_SAM
        )));
        assert!(
            driver
                .book()
                .get(CRUISE_MISSILE, BRAVO_SAM)
                .unwrap()
                .is_complete()
        );
    }

    // ---- Upward reports and exclusions ----

    #[test]
    fn test_lost_delegation_is_reported_to_commander() {
        let mut scenario = scenario();
        scenario.self_asset = BATTALION;
        scenario.simulate_weapons = false;
        // Keep a channel free so Bravo's later failure is geometric
        scenario.assets[3].weapons[0].fire_channels = 2;
        let mut driver = Driver::new(scenario).unwrap();

        let first = driver.tick(0.0).unwrap();
        assert_eq!(weapon_for(&first, CRUISE_MISSILE), Some(BRAVO_SAM));
        assert!(first.committed.iter().all(|m| m.assigning_unit == BATTALION));

        // The missile is long past Bravo's reach
        let later = driver.tick(300.0).unwrap();
        let cancelled = later
            .cancelled
            .iter()
            .find(|m| m.assigned_weapon == BRAVO_SAM)
            .unwrap();
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("no subordinate weapons"));

        let upward: Vec<_> = later
            .envelopes
            .iter()
            .filter_map(|e| match &e.payload {
                Payload::AssignmentStatus(m) if m.reference_track_id == CRUISE_MISSILE => {
                    Some((e, m))
                }
                _ => None,
            })
            .collect();
        assert_eq!(upward.len(), 1);
        let (envelope, message) = upward[0];
        assert_eq!(envelope.sender, BATTALION);
        assert_eq!(envelope.destination, COMMAND);
        assert_eq!(message.status.status, AssignmentStatus::Cantco);
        assert_eq!(
            message.status.cantco_reason.as_deref(),
            Some("no subordinate weapons")
        );
    }

    #[test]
    fn test_cantco_records_exclusion() {
        let mut scenario = scenario();
        scenario.simulate_weapons = false;
        scenario.threats[1].velocity_enu = [-220.0, 0.0, 40.0];
        let mut driver = Driver::new(scenario).unwrap();

        let first = driver.tick(0.0).unwrap();
        assert_eq!(weapon_for(&first, CRUISE_MISSILE), Some(BRAVO_SAM));
        assert!(first.excluded.is_empty());

        // Above the row's altitude band the missile matches no preference
        let climbed = driver.tick(60.0).unwrap();
        assert!(climbed.unpreferred.contains(&CRUISE_MISSILE));
        assert_eq!(climbed.excluded, vec![(CRUISE_MISSILE, BRAVO)]);

        let (envelope, message) = climbed
            .envelopes
            .iter()
            .find_map(|e| match &e.payload {
                Payload::AssignmentStatus(m) if m.reference_track_id == CRUISE_MISSILE => {
                    Some((e, m))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(envelope.sender, BRAVO);
        assert_eq!(envelope.destination, BATTALION);
        assert_eq!(message.status.status, AssignmentStatus::Cantco);
        assert!(driver
            .book()
            .get(CRUISE_MISSILE, BRAVO_SAM)
            .unwrap()
            .is_complete());
    }
}
