#[cfg(test)]
mod tests_lifecycle {
    use crate::support::{Recorder, ask, bid, connector, init_tracing, journal, message};
    use feedbook_rs::prelude::*;
    use feedbook_rs::connector::ConnectorRole;

    #[test]
    fn notification_waits_for_last_fragment() {
        let log = journal();
        let mut mdc = connector(ConnectorConfig::new("tcp"), &["BTCUSDT"]);
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "BTCUSDT", UpdateEffect::L1Qty, false)
            .unwrap();

        let mut first = NormalizedMessage::new().with_last_fragment(false);
        first.push("BTCUSDT", 0, bid(100.0, 1.0));
        mdc.process_incremental(&first, RecvTimes::default());
        assert!(mdc.is_fragment_pending());
        assert!(mdc.end_of_chunk());
        assert!(strategy.updates().is_empty());
        assert_eq!(mdc.dirty().len(), 1);

        mdc.process_incremental(&message("BTCUSDT", ask(101.0, 1.0)), RecvTimes::default());
        assert!(!mdc.is_fragment_pending());
        mdc.end_of_chunk();

        let updates = strategy.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].sides, UpdatedSides::BOTH);
        assert_eq!(updates[0].best_bid, Some(100.0));
        assert_eq!(updates[0].best_ask, Some(101.0));
    }

    #[test]
    fn stop_clears_books_and_notifies_each_strategy_once() {
        let log = journal();
        let mut mdc = connector(ConnectorConfig::new("tcp"), &["BTCUSDT", "ETHUSDT"]);
        let strategy = Recorder::new("s", &log);
        let other = Recorder::new("other", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "BTCUSDT", UpdateEffect::L1Qty, false)
            .unwrap();
        mdc.subscribe_mkt_data(strategy.clone(), "ETHUSDT", UpdateEffect::L1Qty, false)
            .unwrap();
        mdc.subscribe_mkt_data(other.clone(), "ETHUSDT", UpdateEffect::L2, false)
            .unwrap();
        mdc.process_incremental(&message("BTCUSDT", bid(100.0, 1.0)), RecvTimes::default());
        mdc.end_of_chunk();
        mdc.process_incremental(&message("BTCUSDT", bid(99.0, 1.0)), RecvTimes::default());

        mdc.stop();

        assert_eq!(strategy.events(), vec![TradingEvent::Stopped]);
        assert_eq!(other.events(), vec![TradingEvent::Stopped]);
        assert!(mdc.dirty().is_empty());
        assert_eq!(
            mdc.with_book("BTCUSDT", |book| (book.is_empty(), book.is_initialized())),
            Some((true, false))
        );
    }

    #[test]
    fn reset_sends_market_data_reset() {
        let log = journal();
        let mut mdc = connector(ConnectorConfig::new("tcp"), &["BTCUSDT"]);
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "BTCUSDT", UpdateEffect::L1Qty, false)
            .unwrap();
        mdc.process_incremental(&message("BTCUSDT", bid(100.0, 1.0)), RecvTimes::default());

        mdc.reset();

        assert_eq!(strategy.events(), vec![TradingEvent::MarketDataReset]);
        assert_eq!(mdc.with_book("BTCUSDT", |book| book.is_empty()), Some(true));
    }

    #[test]
    fn secondary_shares_books_of_primary() {
        let log = journal();
        let mut primary = connector(ConnectorConfig::new("primary"), &["BTCUSDT"]);
        let mut secondary = MarketDataConnector::secondary(
            &primary,
            ConnectorConfig::new("secondary").with_book(BookConfig::aggregated(5)),
        )
        .unwrap();
        assert_eq!(secondary.role(), ConnectorRole::Secondary);
        assert_eq!(primary.role(), ConnectorRole::Primary);

        let strategy = Recorder::new("s", &log);
        primary
            .subscribe_mkt_data(strategy.clone(), "BTCUSDT", UpdateEffect::L1Qty, false)
            .unwrap();

        secondary.process_incremental(&message("BTCUSDT", bid(100.0, 1.0)), RecvTimes::default());
        secondary.end_of_chunk();

        assert_eq!(strategy.updates().len(), 1);
        assert_eq!(
            primary.with_book("BTCUSDT", |book| book.config().max_depth),
            Some(Some(20))
        );
        assert_eq!(primary.books().len(), 1);

        // only the primary clears shared books
        secondary.stop();
        assert_eq!(primary.with_book("BTCUSDT", |book| book.is_empty()), Some(false));
        primary.stop();
        assert_eq!(primary.with_book("BTCUSDT", |book| book.is_empty()), Some(true));
    }

    #[test]
    fn dropping_primary_invalidates_shared_books() {
        let mut primary = connector(ConnectorConfig::new("primary"), &["BTCUSDT"]);
        primary.process_incremental(&message("BTCUSDT", bid(100.0, 1.0)), RecvTimes::default());
        primary.end_of_chunk();
        let secondary =
            MarketDataConnector::secondary(&primary, ConnectorConfig::new("secondary")).unwrap();

        drop(primary);

        assert_eq!(
            secondary.with_book("BTCUSDT", |book| (book.is_empty(), book.is_initialized())),
            Some((true, false))
        );
    }

    #[test]
    fn connector_from_json_config() {
        init_tracing();
        let config = ConnectorConfig::from_json(
            r#"{
                "name": "moex-olog",
                "is_multicast": true,
                "latency_sink": "histogram",
                "book": { "max_depth": null, "order_registry": true, "registry_capacity": 128 }
            }"#,
        )
        .unwrap();
        let mut mdc = MarketDataConnector::new(config).unwrap();

        assert_eq!(mdc.config().name, "moex-olog");
        assert!(mdc.config().book.order_registry);
        mdc.latency_stats_mut()
            .record(LatencyStage::EndToEnd, 1_000, 1_500);
        let end_to_end = mdc.latency_stats().stage(LatencyStage::EndToEnd);
        assert_eq!(end_to_end.count, 1);
        assert!(end_to_end.p99.is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = MarketDataConnector::new(ConnectorConfig::new("bad").with_max_dirty_books(0))
            .unwrap_err();
        assert!(matches!(err, BookError::InvalidConfig { .. }));
    }

    #[test]
    fn duplicate_instrument_is_rejected() {
        let mut mdc = connector(ConnectorConfig::new("tcp"), &["BTCUSDT"]);
        let err = mdc
            .add_instrument(std::sync::Arc::new(Instrument::new("BTCUSDT", 0.01)))
            .unwrap_err();
        assert!(matches!(err, BookError::DuplicateInstrument(_)));
    }
}
