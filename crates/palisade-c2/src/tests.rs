#[cfg(test)]
mod tests {
    use palisade_core::enums::{ShotDoctrine, SystemStatus};
    use palisade_core::{AssetMap, AssetRecord, Identifier, Position, Track};
    use palisade_engage::AssignmentMessage;

    use crate::error::RouteError;
    use crate::messages::{
        CueMessage, MessageCategory, Payload, StatusMessage, TrackUpdateMessage,
    };
    use crate::router::{DisseminationRouter, DynamicStyle, RoutingConfig, RoutingPolicies};

    const ROOT: Identifier = Identifier::unit(1);
    const MID: Identifier = Identifier::unit(2);
    const LEAF: Identifier = Identifier::unit(3);
    const ROOT_PEER: Identifier = Identifier::unit(4);
    const SIBLING: Identifier = Identifier::unit(5);

    fn node(id: Identifier, c2: bool) -> AssetRecord {
        AssetRecord::new(id, &format!("node {}", id.unit), Position::default()).with_c2(c2)
    }

    /// leaf → mid → root, root peered with another root, mid has a sibling.
    /// Only the roots are C2-capable.
    fn three_level() -> AssetMap {
        let mut assets = AssetMap::new();
        for (id, c2) in [(ROOT, true), (MID, false), (LEAF, false), (ROOT_PEER, true), (SIBLING, false)] {
            assets.insert(node(id, c2));
        }
        assets.add_direct_subordinate(ROOT, MID).unwrap();
        assets.add_direct_subordinate(MID, LEAF).unwrap();
        assets.add_direct_subordinate(ROOT, SIBLING).unwrap();
        assets.add_direct_peer(ROOT, ROOT_PEER).unwrap();
        assets.add_direct_peer(ROOT_PEER, ROOT).unwrap();
        assets
    }

    fn config(style: DynamicStyle) -> RoutingConfig {
        RoutingConfig {
            dynamic_style: style,
            ..RoutingConfig::default()
        }
    }

    fn cue_to(unit: Identifier, from: Identifier) -> Payload {
        Payload::Cue(CueMessage {
            reference_track_id: Identifier::new(900, 1),
            cued_unit: unit,
            initiating_unit: from,
        })
    }

    fn assignment_to(weapon: Identifier, assigning: Identifier) -> AssignmentMessage {
        AssignmentMessage::new(Identifier::new(900, 1), weapon, assigning, ShotDoctrine::Shoot1, 0.0)
    }

    fn status_from(asset: Identifier) -> Payload {
        Payload::Status(StatusMessage {
            asset,
            status: SystemStatus::Green,
            open_assignments: 1,
            max_assignments: 2,
            time: 0.0,
        })
    }

    // ---- Policies ----

    #[test]
    fn test_policy_mask_combines() {
        let mask = RoutingPolicies::SUBORDINATE | RoutingPolicies::COMMANDER;
        assert!(mask.contains(RoutingPolicies::SUBORDINATE));
        assert!(mask.contains(RoutingPolicies::COMMANDER));
        assert!(!mask.contains(RoutingPolicies::PEER));
        assert!(!mask.contains(RoutingPolicies::NONE));
        assert!(RoutingPolicies::default().is_empty());
    }

    #[test]
    fn test_default_config() {
        let cfg = RoutingConfig::default();
        assert_eq!(cfg.policy(MessageCategory::Assignment), RoutingPolicies::DYNAMIC);
        assert_eq!(cfg.policy(MessageCategory::TrackUpdate), RoutingPolicies::COMMANDER);
        assert_eq!(cfg.dynamic_style, DynamicStyle::Direct);
    }

    #[test]
    fn test_config_from_json() {
        let cfg = RoutingConfig::from_json(
            r#"{ "policies": { "status": 5, "cue": 8 }, "dynamic_style": "NEXT_C2" }"#,
        )
        .unwrap();
        assert_eq!(
            cfg.policy(MessageCategory::Status),
            RoutingPolicies::SUBORDINATE | RoutingPolicies::COMMANDER
        );
        assert_eq!(cfg.policy(MessageCategory::Assignment), RoutingPolicies::NONE);
        assert_eq!(cfg.dynamic_style, DynamicStyle::NextC2);
        assert!(RoutingConfig::from_json("{ \"dynamic_style\": \"SIDEWAYS\" }").is_err());
    }

    #[test]
    fn test_policies_are_additive_and_deduplicated() {
        let assets = three_level();
        let mut cfg = RoutingConfig::default();
        cfg.set_policy(
            MessageCategory::Status,
            RoutingPolicies::SUBORDINATE | RoutingPolicies::PEER | RoutingPolicies::COMMANDER,
        );
        let router = DisseminationRouter::new(ROOT, &assets, &cfg);
        let out = router.route(&status_from(ROOT), 12.5).unwrap();
        let dests: Vec<Identifier> = out.iter().map(|e| e.destination).collect();
        assert_eq!(dests, vec![MID, SIBLING, ROOT_PEER], "root has no commander");

        // Dynamic to a subordinate that is also covered by SUBORDINATE
        cfg.set_policy(
            MessageCategory::Cue,
            RoutingPolicies::SUBORDINATE | RoutingPolicies::DYNAMIC,
        );
        let router = DisseminationRouter::new(ROOT, &assets, &cfg);
        let out = router.route(&cue_to(MID, ROOT), 1.0).unwrap();
        let dests: Vec<Identifier> = out.iter().map(|e| e.destination).collect();
        assert_eq!(dests, vec![MID, SIBLING], "one copy per destination");
    }

    #[test]
    fn test_envelopes_are_stamped() {
        let assets = three_level();
        let cfg = RoutingConfig::default();
        let router = DisseminationRouter::new(LEAF, &assets, &cfg);
        let out = router.route(&status_from(LEAF), 42.0).unwrap();
        assert_eq!(out.len(), 1);
        let env = &out[0];
        assert_eq!(env.sender, LEAF);
        assert_eq!(env.destination, MID);
        assert!(!env.broadcast);
        assert_eq!(env.transmit_time, 42.0);
        assert_eq!(env.payload, status_from(LEAF));
    }

    #[test]
    fn test_self_addressed_bypasses_hierarchy() {
        let assets = three_level();
        let mut cfg = config(DynamicStyle::NextC2);
        cfg.set_policy(
            MessageCategory::Cue,
            RoutingPolicies::SUBORDINATE | RoutingPolicies::COMMANDER | RoutingPolicies::DYNAMIC,
        );
        let router = DisseminationRouter::new(MID, &assets, &cfg);
        let out = router.route(&cue_to(MID, ROOT), 3.0).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].destination, MID);
        assert_eq!(out[0].sender, MID);
    }

    #[test]
    fn test_unknown_sender_is_error() {
        let assets = three_level();
        let cfg = RoutingConfig::default();
        let router = DisseminationRouter::new(Identifier::unit(99), &assets, &cfg);
        assert_eq!(
            router.route(&status_from(ROOT), 0.0),
            Err(RouteError::UnknownSender(Identifier::unit(99)))
        );
    }

    // ---- Semantic destinations ----

    #[test]
    fn test_semantic_destinations_by_category() {
        let weapon = Identifier::new(3, 1);
        let msg = assignment_to(weapon, ROOT);
        assert_eq!(Payload::Assignment(msg.clone()).semantic_destination(), Some(LEAF));
        assert_eq!(Payload::AssignmentCancel(msg.clone()).semantic_destination(), Some(LEAF));
        assert_eq!(Payload::AssignmentStatus(msg).semantic_destination(), Some(ROOT));
        assert_eq!(cue_to(MID, ROOT).semantic_destination(), Some(MID));

        let track = Track::new(Identifier::new(900, 1), 0.0, Position::default(), Default::default());
        let tau = Payload::TrackAssignmentUpdate(TrackUpdateMessage {
            track: track.clone(),
            destination: Some(SIBLING),
        });
        assert_eq!(tau.semantic_destination(), Some(SIBLING));
        assert_eq!(tau.category(), MessageCategory::TrackAssignmentUpdate);
        let update = Payload::TrackUpdate(TrackUpdateMessage {
            track,
            destination: None,
        });
        assert_eq!(update.semantic_destination(), None);
        assert_eq!(status_from(ROOT).semantic_destination(), None);
    }

    // ---- Dynamic styles ----

    #[test]
    fn test_direct_style_addresses_destination() {
        let assets = three_level();
        let cfg = config(DynamicStyle::Direct);
        let router = DisseminationRouter::new(ROOT, &assets, &cfg);
        let payload = Payload::Assignment(assignment_to(Identifier::new(3, 1), ROOT));
        let out = router.route(&payload, 0.0).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].destination, LEAF);
    }

    #[test]
    fn test_next_unit_walks_the_chain() {
        let assets = three_level();
        let cfg = config(DynamicStyle::NextUnit);

        let root = DisseminationRouter::new(ROOT, &assets, &cfg);
        assert_eq!(root.next_hop(LEAF), MID, "down through the subtree holding the leaf");
        assert_eq!(root.next_hop(ROOT_PEER), ROOT_PEER, "peers are adjacent");

        let leaf = DisseminationRouter::new(LEAF, &assets, &cfg);
        assert_eq!(leaf.next_hop(SIBLING), MID, "up when the destination is elsewhere");

        let mid = DisseminationRouter::new(MID, &assets, &cfg);
        assert_eq!(mid.next_hop(LEAF), LEAF);
        assert_eq!(mid.next_hop(SIBLING), ROOT);

        let payload = Payload::AssignmentStatus(assignment_to(Identifier::new(3, 1), ROOT));
        let out = leaf.route(&payload, 0.0).unwrap();
        assert_eq!(out[0].destination, MID);
    }

    #[test]
    fn test_next_c2_relays_one_hop_at_a_time() {
        let assets = three_level();
        let cfg = config(DynamicStyle::NextC2);

        // Only the root is C2-capable on the way from the leaf to the root's peer
        let leaf = DisseminationRouter::new(LEAF, &assets, &cfg);
        assert_eq!(leaf.c2_path(ROOT_PEER), vec![MID, ROOT, ROOT_PEER]);
        assert_eq!(leaf.next_hop(ROOT_PEER), MID, "mid node first");

        // The mid node, receiving the relay, resolves to the root
        let mid = DisseminationRouter::new(MID, &assets, &cfg);
        assert_eq!(mid.c2_path(ROOT_PEER), vec![ROOT, ROOT_PEER]);
        assert_eq!(mid.next_hop(ROOT_PEER), ROOT);

        // The root has no C2 node left ahead and addresses the peer
        let root = DisseminationRouter::new(ROOT, &assets, &cfg);
        assert_eq!(root.next_hop(ROOT_PEER), ROOT_PEER);

        let out = leaf.route(&cue_to(ROOT_PEER, LEAF), 7.0).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].destination, MID);
    }

    #[test]
    fn test_next_c2_falls_back_to_destination() {
        let mut assets = three_level();
        assets.get_mut(ROOT).unwrap().c2_capable = false;
        let cfg = config(DynamicStyle::NextC2);

        let leaf = DisseminationRouter::new(LEAF, &assets, &cfg);
        // Path leaf → mid → root → peer holds no C2 node before the peer
        assert_eq!(leaf.next_hop(ROOT_PEER), ROOT_PEER);

        // A destination outside the hierarchy is reached directly as well
        let outsider = Identifier::unit(77);
        assert_eq!(leaf.next_hop(outsider), outsider);
        assert_eq!(leaf.c2_path(outsider), vec![MID, ROOT, outsider]);
    }
}
