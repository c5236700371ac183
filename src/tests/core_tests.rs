//! Document tests
//!
//! Ids, mutation, deletion and snapshots, exercised through the public
//! `Document` API the way an editing surface drives it.

#[cfg(test)]
mod core_tests {
    use std::io::Write;

    use crate::core::config::SettingsError;
    use crate::core::{
        BlockId, BlockKind, ConfigError, Document, DocumentError, EditorConfig, Endpoint,
        FieldValue, WireId,
    };
    use crate::geometry::placement::PlacementConflict;
    use crate::geometry::{Rect, Segment};

    fn two_block_document() -> Document {
        let mut doc = Document::new();
        doc.place_block(BlockKind::Input, Rect::new(0.0, 0.0, 100.0, 50.0))
            .unwrap();
        doc.place_block(BlockKind::Output, Rect::new(300.0, 0.0, 100.0, 50.0))
            .unwrap();
        doc.place_wire(Segment::from_coords(100.0, 25.0, 300.0, 25.0))
            .unwrap();
        doc
    }

    /// Blocks and wires draw ids from one counter, in placement order
    #[test]
    fn test_ids_follow_placement_order() {
        let doc = two_block_document();
        assert_eq!(doc.blocks()[0].id, BlockId(0));
        assert_eq!(doc.blocks()[1].id, BlockId(1));
        assert_eq!(doc.wires()[0].id, WireId(2));
        assert_eq!(doc.next_id(), Some(3));
    }

    /// A rejected placement does not consume an id
    #[test]
    fn test_rejected_placement_keeps_counter() {
        let mut doc = two_block_document();
        let err = doc
            .place_block(BlockKind::Clock, Rect::new(50.0, 10.0, 100.0, 50.0))
            .unwrap_err();
        assert_eq!(err, PlacementConflict::BlockOverlap(BlockId(0)));
        assert_eq!(doc.blocks().len(), 2);
        assert_eq!(doc.next_id(), Some(3));
    }

    /// Deleted ids are never handed out again; clearing starts over
    #[test]
    fn test_delete_and_clear() {
        let mut doc = two_block_document();
        let removed = doc.delete_block(BlockId(1)).unwrap();
        assert_eq!(removed.kind(), BlockKind::Output);

        let id = doc
            .place_block(BlockKind::Output, Rect::new(300.0, 100.0, 100.0, 50.0))
            .unwrap();
        assert_eq!(id, BlockId(3), "ids must not be reused");

        doc.clear();
        assert!(doc.is_empty());
        let id = doc
            .place_block(BlockKind::Moore, Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        assert_eq!(id, BlockId(0));
    }

    #[test]
    fn test_delete_missing_entities() {
        let mut doc = two_block_document();
        assert!(matches!(
            doc.delete_block(BlockId(2)),
            Err(DocumentError::BlockNotFound(BlockId(2)))
        ));
        assert!(matches!(
            doc.delete_wire(WireId(0)),
            Err(DocumentError::WireNotFound(WireId(0)))
        ));
    }

    /// Deleting a block leaves the wires that pointed at it unresolved there
    #[test]
    fn test_delete_block_clears_wire_references() {
        let mut doc = two_block_document();
        doc.resolve_connections().unwrap();
        assert_eq!(
            doc.wire(WireId(2)).unwrap().end(),
            Some(Endpoint::Block(BlockId(1)))
        );

        doc.delete_block(BlockId(1)).unwrap();
        let wire = doc.wire(WireId(2)).unwrap();
        assert_eq!(wire.start(), Some(Endpoint::Block(BlockId(0))));
        assert_eq!(wire.end(), None);
        assert!(doc.resolved_edges().is_empty());
    }

    #[test]
    fn test_block_field_updates() {
        let mut doc = two_block_document();
        doc.set_block_field(BlockId(0), "filePath", "stim.csv").unwrap();
        doc.set_block_field_text(BlockId(0), "plot", "True").unwrap();

        let input = doc.block(BlockId(0)).unwrap();
        assert_eq!(
            input.field("filePath"),
            Some(FieldValue::FilePath("stim.csv".into()))
        );
        assert_eq!(input.field("plot"), Some(FieldValue::Flag(true)));

        let err = doc
            .set_block_field(BlockId(1), "timePeriod", 2.0)
            .unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Config(ConfigError::UnknownField(_))
        ));
        assert!(matches!(
            doc.set_block_field(BlockId(9), "plot", true),
            Err(DocumentError::BlockNotFound(_))
        ));
    }

    #[test]
    fn test_wire_attribute_updates() {
        let mut doc = two_block_document();
        doc.set_bit_slice(WireId(2), "0", "4").unwrap();
        doc.set_clock_line(WireId(2), true).unwrap();
        let wire = doc.wire(WireId(2)).unwrap();
        assert_eq!(wire.lsb, "0");
        assert_eq!(wire.msb, "4");
        assert!(wire.clock_line);
        assert!(doc.set_clock_line(WireId(7), true).is_err());
    }

    /// Snapshots keep ids, configuration and wire attributes
    #[test]
    fn test_snapshot_round_trip_on_disk() {
        let mut doc = two_block_document();
        doc.set_block_field(BlockId(0), "blockID", "Stimulus").unwrap();
        doc.set_bit_slice(WireId(2), "1", "3").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagram.json");
        doc.save(&path).unwrap();

        let loaded = Document::load(&path, EditorConfig::default()).unwrap();
        assert_eq!(loaded.blocks(), doc.blocks());
        assert_eq!(loaded.wires().len(), 1);
        assert_eq!(loaded.wires()[0].segment, doc.wires()[0].segment);
        assert_eq!(loaded.wires()[0].lsb, "1");
        assert_eq!(loaded.wires()[0].start(), None, "endpoints are resolved again after load");
        assert_eq!(loaded.next_id(), Some(3));
    }

    /// Loading moves the counter past the largest stored id
    #[test]
    fn test_load_advances_counter_past_gaps() {
        let mut doc = two_block_document();
        doc.delete_block(BlockId(0)).unwrap();
        let json = doc.to_json().unwrap();

        let mut loaded = Document::from_json(&json, EditorConfig::default()).unwrap();
        let id = loaded
            .place_block(BlockKind::Clock, Rect::new(0.0, 200.0, 50.0, 50.0))
            .unwrap();
        assert_eq!(id, BlockId(3));
    }

    /// A snapshot whose entities conflict is rejected during replay
    #[test]
    fn test_load_rejects_overlapping_blocks() {
        let json = r#"{
            "blocks": [
                { "id": 0, "rect": { "x": 0.0, "y": 0.0, "width": 50.0, "height": 50.0 },
                  "config": { "kind": "Input", "fields": {} } },
                { "id": 1, "rect": { "x": 10.0, "y": 10.0, "width": 50.0, "height": 50.0 },
                  "config": { "kind": "Output", "fields": {} } }
            ],
            "wires": []
        }"#;
        match Document::from_json(json, EditorConfig::default()) {
            Err(DocumentError::Replay { id, source }) => {
                assert_eq!(id, 1);
                assert_eq!(source, PlacementConflict::BlockOverlap(BlockId(0)));
            }
            other => panic!("expected replay failure, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let json = r#"{
            "blocks": [
                { "id": 4, "rect": { "x": 0.0, "y": 0.0, "width": 50.0, "height": 50.0 },
                  "config": { "kind": "Input", "fields": {} } }
            ],
            "wires": [
                { "id": 4,
                  "segment": { "tail": { "x": 60.0, "y": 0.0 }, "head": { "x": 90.0, "y": 0.0 } },
                  "arrowhead": { "tip": { "x": 90.0, "y": 0.0 },
                                 "left": { "x": 80.0, "y": 0.0 }, "right": { "x": 80.0, "y": 0.0 } },
                  "lsb": "--", "msb": "--", "clock_line": false }
            ]
        }"#;
        assert!(matches!(
            Document::from_json(json, EditorConfig::default()),
            Err(DocumentError::DuplicateId(4))
        ));
    }

    /// Missing config fields fall back to the kind's defaults
    #[test]
    fn test_load_fills_default_fields() {
        let json = r#"{
            "blocks": [
                { "id": 0, "rect": { "x": 0.0, "y": 0.0, "width": 50.0, "height": 50.0 },
                  "config": { "kind": "Clock", "fields": { "block_id": "clk" } } }
            ]
        }"#;
        let doc = Document::from_json(json, EditorConfig::default()).unwrap();
        let clock = &doc.blocks()[0];
        assert_eq!(clock.label(), "clk");
        assert_eq!(clock.field("timePeriod"), Some(FieldValue::Float(1.2)));
    }

    /// Stored field values go through the same checks as edits
    #[test]
    fn test_load_rejects_out_of_range_fields() {
        let clock = r#"{
            "blocks": [
                { "id": 0, "rect": { "x": 0.0, "y": 0.0, "width": 50.0, "height": 50.0 },
                  "config": { "kind": "Clock", "fields": { "initial_value": 7 } } }
            ]
        }"#;
        assert!(matches!(
            Document::from_json(clock, EditorConfig::default()),
            Err(DocumentError::Config(ConfigError::OutOfRange { value: 7, .. }))
        ));

        let moore = r#"{
            "blocks": [
                { "id": 0, "rect": { "x": 0.0, "y": 0.0, "width": 50.0, "height": 50.0 },
                  "config": { "kind": "Moore", "fields": { "max_out_size": -3 } } }
            ]
        }"#;
        assert!(matches!(
            Document::from_json(moore, EditorConfig::default()),
            Err(DocumentError::Config(ConfigError::OutOfRange { value: -3, .. }))
        ));
    }

    /// A snapshot holding the largest id leaves nothing to hand out
    #[test]
    fn test_exhausted_ids_refuse_placement() {
        let json = r#"{
            "blocks": [
                { "id": 18446744073709551615,
                  "rect": { "x": 0.0, "y": 0.0, "width": 50.0, "height": 50.0 },
                  "config": { "kind": "Output", "fields": {} } }
            ]
        }"#;
        let mut doc = Document::from_json(json, EditorConfig::default()).unwrap();
        assert_eq!(doc.next_id(), None);
        assert_eq!(
            doc.place_block(BlockKind::Input, Rect::new(200.0, 0.0, 50.0, 50.0)),
            Err(PlacementConflict::IdsExhausted)
        );
        assert_eq!(
            doc.place_wire(Segment::from_coords(60.0, 0.0, 150.0, 0.0)),
            Err(PlacementConflict::IdsExhausted)
        );
        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.wires().is_empty());

        doc.clear();
        assert_eq!(
            doc.place_block(BlockKind::Input, Rect::new(0.0, 0.0, 50.0, 50.0)),
            Ok(BlockId(0))
        );
    }

    /// Property-editor text that is not a finite number is refused
    #[test]
    fn test_non_finite_field_text_refused() {
        let mut doc = Document::new();
        let clock = doc
            .place_block(BlockKind::Clock, Rect::new(0.0, 0.0, 50.0, 50.0))
            .unwrap();
        assert!(doc.set_block_field_text(clock, "timePeriod", "NaN").is_err());
        assert!(doc.set_block_field_text(clock, "onTime", "inf").is_err());
        let block = doc.block(clock).unwrap();
        assert_eq!(block.field("timePeriod"), Some(FieldValue::Float(1.2)));
        assert_eq!(block.field("onTime"), Some(FieldValue::Float(0.6)));
    }

    #[test]
    fn test_malformed_snapshot() {
        assert!(matches!(
            Document::from_json("[1, 2", EditorConfig::default()),
            Err(DocumentError::Serde(_))
        ));
        assert!(matches!(
            Document::load("/definitely/not/here.json", EditorConfig::default()),
            Err(DocumentError::Io(_))
        ));
    }

    /// Settings files override only what they name
    #[test]
    fn test_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "proximity_threshold": 25.0 }}"#).unwrap();
        let config = EditorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.proximity_threshold, 25.0);
        assert_eq!(config.arrow_length, 10.0);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{ "retract_step_fraction": 0.0 }}"#).unwrap();
        assert!(matches!(
            EditorConfig::from_file(bad.path()),
            Err(SettingsError::Invalid(_))
        ));
    }

    /// A tight threshold set on the document is honoured by resolution
    #[test]
    fn test_document_uses_configured_threshold() {
        let config = EditorConfig {
            proximity_threshold: 5.0,
            ..EditorConfig::default()
        };
        let mut doc = Document::with_config(config);
        doc.place_block(BlockKind::Input, Rect::new(0.0, 0.0, 100.0, 50.0))
            .unwrap();
        doc.place_block(BlockKind::Output, Rect::new(300.0, 0.0, 100.0, 50.0))
            .unwrap();
        doc.place_wire(Segment::from_coords(100.0, 25.0, 300.0, 25.0))
            .unwrap();
        assert!(doc.resolve_connections().is_err());
    }
}
