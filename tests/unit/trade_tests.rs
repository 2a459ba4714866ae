#[cfg(test)]
mod tests_trade {
    use crate::support::{FillRecorder, Recorder, bid, connector, entries, journal, message};
    use feedbook_rs::prelude::*;
    use std::sync::Arc;

    fn order_log_config(name: &str) -> ConnectorConfig {
        ConnectorConfig::new(name).with_book(BookConfig::order_log(1_024))
    }

    fn order(action: Action, order_id: OrderId, price: f64, qty: f64) -> NormalizedUpdate {
        NormalizedUpdate::order(BookSide::Bid, action, order_id, price, qty)
    }

    #[test]
    fn traded_delete_infers_trade() {
        let log = journal();
        let mut mdc = connector(order_log_config("olog"), &["SBER"]);
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "SBER", UpdateEffect::Error, false)
            .unwrap();

        mdc.process_incremental(
            &message("SBER", order(Action::New, 1, 250.0, 10.0)),
            RecvTimes::default(),
        );
        let outcome = mdc.process_incremental(
            &message(
                "SBER",
                order(Action::Delete, 1, f64::NAN, 0.0).with_was_traded(true),
            ),
            RecvTimes::at(42),
        );

        assert_eq!(outcome.trades, 1);
        let trades = strategy.trades();
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.qty, 10.0);
        assert_eq!(trade.price, 250.0);
        assert_eq!(trade.aggressor, Some(BookSide::Ask));
        assert_eq!(trade.order_id, Some(1));
        assert_eq!(trade.origin, TradeOrigin::Inferred);
        assert_eq!(trade.receipt_ts, 42);
        assert!(!trade.is_own());
        assert_eq!(trade.instrument.symbol, "SBER");
    }

    #[test]
    fn only_traded_decreases_infer_trades() {
        let log = journal();
        let mut mdc = connector(order_log_config("olog"), &["SBER"]);
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "SBER", UpdateEffect::L1Qty, false)
            .unwrap();

        let mut msg = NormalizedMessage::new();
        msg.push("SBER", 0, order(Action::New, 1, 250.0, 10.0))
            // partial fill of 4
            .push(
                "SBER",
                0,
                order(Action::Change, 1, f64::NAN, 6.0).with_was_traded(true),
            )
            // amendment down, not a fill
            .push("SBER", 0, order(Action::Change, 1, f64::NAN, 5.0))
            // increase flagged as traded
            .push(
                "SBER",
                0,
                order(Action::Change, 1, f64::NAN, 8.0).with_was_traded(true),
            );
        let outcome = mdc.process_incremental(&msg, RecvTimes::default());

        assert_eq!(outcome.trades, 1);
        let trades = strategy.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].qty, 4.0);
        assert_eq!(trades[0].price, 250.0);
    }

    #[test]
    fn own_fill_reaches_order_manager_first() {
        let log = journal();
        let manager = FillRecorder::new(&log);
        let mut mdc = connector(order_log_config("olog"), &["SBER"]).with_order_manager(manager.clone());
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "SBER", UpdateEffect::L1Qty, false)
            .unwrap();

        // registered before the venue confirms the order
        assert!(!mdc.register_order("SBER", 3, 77).unwrap());
        mdc.process_incremental(
            &message("SBER", order(Action::New, 3, 250.0, 10.0)),
            RecvTimes::default(),
        );
        mdc.process_incremental(
            &message(
                "SBER",
                order(Action::Change, 3, f64::NAN, 6.0).with_was_traded(true),
            ),
            RecvTimes::default(),
        );

        assert_eq!(manager.fills(), vec![(77, 4.0)]);
        assert_eq!(entries(&log), vec!["om:77:4", "s:trade:4"]);
        assert!(strategy.trades()[0].is_own());
    }

    #[test]
    fn own_order_survives_snapshot_refresh() {
        let log = journal();
        let manager = FillRecorder::new(&log);
        let mut mdc = connector(order_log_config("olog"), &["SBER"]).with_order_manager(manager.clone());
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "SBER", UpdateEffect::L1Qty, false)
            .unwrap();

        mdc.process_incremental(
            &message("SBER", order(Action::New, 1, 250.0, 3.0)),
            RecvTimes::default(),
        );
        assert!(mdc.register_order("SBER", 1, 10).unwrap());

        let mut snapshot = NormalizedMessage::new();
        snapshot
            .push("SBER", 0, order(Action::New, 1, 250.0, 3.0))
            .push("SBER", 0, order(Action::New, 2, 249.0, 1.0));
        mdc.process_snapshot(&snapshot, RecvTimes::default());
        mdc.process_incremental(
            &message(
                "SBER",
                order(Action::Delete, 1, f64::NAN, 0.0).with_was_traded(true),
            ),
            RecvTimes::default(),
        );

        assert_eq!(manager.fills(), vec![(10, 3.0)]);
        assert!(strategy.trades()[0].is_own());
        // the other order was never ours
        assert_eq!(
            mdc.with_book("SBER", |book| book.registry().and_then(|r| r.own_request(2))),
            Some(None)
        );
    }

    #[test]
    fn explicit_trade_is_correlated_with_own_order() {
        let log = journal();
        let manager = FillRecorder::new(&log);
        let mut mdc = connector(order_log_config("olog"), &["SBER"]).with_order_manager(manager.clone());
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "SBER", UpdateEffect::L2, false)
            .unwrap();
        mdc.register_order("SBER", 5, 500).unwrap();

        let fields = TradeFields {
            exec_id: Some(9_001),
            aggressor: Some(BookSide::Bid),
            settl_date: Some(20261020),
        };
        let mut msg = NormalizedMessage::new();
        msg.push("SBER", 7, NormalizedUpdate::trade(251.0, 2.0, fields).with_order_id(5))
            .push("SBER", 7, NormalizedUpdate::trade(251.5, 1.0, fields));
        let outcome = mdc.process_incremental(&msg, RecvTimes::default());

        assert_eq!(outcome.trades, 2);
        assert_eq!(manager.fills(), vec![(500, 2.0)]);
        let trades = strategy.trades();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].origin, TradeOrigin::Explicit);
        assert_eq!(trades[0].exec_id, Some(9_001));
        assert_eq!(trades[0].exchange_ts, 7);
        assert_eq!(trades[0].own_request, Some(500));
        assert_eq!(trades[1].own_request, None);
        assert_eq!(trades[1].notional(), 251.5);
        // trades alone do not dirty the book
        assert!(mdc.dirty().is_empty());
    }

    #[test]
    fn trade_forwarding_can_be_disabled() {
        let log = journal();
        let manager = FillRecorder::new(&log);
        let mut mdc = connector(order_log_config("olog").with_notify_trades(false), &["SBER"])
            .with_order_manager(manager.clone());
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "SBER", UpdateEffect::L1Qty, false)
            .unwrap();
        mdc.register_order("SBER", 1, 10).unwrap();

        let mut msg = NormalizedMessage::new();
        msg.push("SBER", 0, order(Action::New, 1, 250.0, 3.0)).push(
            "SBER",
            0,
            order(Action::Delete, 1, f64::NAN, 0.0).with_was_traded(true),
        );
        mdc.process_incremental(&msg, RecvTimes::default());

        assert_eq!(manager.fills(), vec![(10, 3.0)]);
        assert!(strategy.trades().is_empty());
    }

    #[test]
    fn settlement_date_defaults_to_instrument() {
        let log = journal();
        let mut mdc = connector(order_log_config("olog"), &[]);
        mdc.add_instrument(Arc::new(
            Instrument::new("SiZ6", 1.0).with_settl_date(20261217),
        ))
        .unwrap();
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "SiZ6", UpdateEffect::L1Qty, false)
            .unwrap();

        let trade = NormalizedUpdate::trade(90_000.0, 1.0, TradeFields::default());
        mdc.process_incremental(&message("SiZ6", trade), RecvTimes::default());

        assert_eq!(strategy.trades()[0].settl_date, Some(20261217));
        assert_eq!(strategy.trades()[0].aggressor, None);
    }

    #[test]
    fn dynamic_init_mutes_strategies_not_order_manager() {
        let log = journal();
        let manager = FillRecorder::new(&log);
        let config = order_log_config("mcast")
            .with_multicast(true)
            .with_dynamic_init(true);
        let mut mdc = connector(config, &["SBER"]).with_order_manager(manager.clone());
        let strategy = Recorder::new("s", &log);
        mdc.subscribe_mkt_data(strategy.clone(), "SBER", UpdateEffect::L1Qty, false)
            .unwrap();
        mdc.register_order("SBER", 1, 10).unwrap();
        assert!(mdc.is_dynamic_init());

        let mut snapshot = NormalizedMessage::new();
        snapshot.push("SBER", 0, order(Action::New, 1, 250.0, 3.0).with_seq(1, 1));
        mdc.process_snapshot(&snapshot, RecvTimes::default());
        mdc.process_incremental(
            &message(
                "SBER",
                order(Action::Change, 1, f64::NAN, 1.0)
                    .with_was_traded(true)
                    .with_seq(2, 2),
            ),
            RecvTimes::default(),
        );
        mdc.end_of_chunk();

        assert_eq!(manager.fills(), vec![(10, 2.0)]);
        assert!(strategy.trades().is_empty());
        assert!(strategy.updates().is_empty());
        // updates were applied nonetheless
        assert_eq!(mdc.with_book("SBER", |book| book.qty_at(BookSide::Bid, 250.0)), Some(Some(1.0)));

        mdc.end_dynamic_init();
        assert!(!mdc.is_dynamic_init());
        mdc.process_incremental(
            &message("SBER", order(Action::New, 2, 251.0, 1.0).with_seq(3, 3)),
            RecvTimes::default(),
        );
        mdc.end_of_chunk();
        assert_eq!(strategy.updates().len(), 1);
    }

    #[test]
    fn dynamic_init_is_ignored_for_tcp_feeds() {
        let mdc = connector(
            ConnectorConfig::new("tcp").with_dynamic_init(true),
            &["BTCUSDT"],
        );
        assert!(!mdc.is_dynamic_init());
    }

    #[test]
    fn own_orders_need_an_order_log_book() {
        let mut mdc = connector(ConnectorConfig::new("tcp"), &["BTCUSDT"]);
        mdc.process_incremental(&message("BTCUSDT", bid(100.0, 1.0)), RecvTimes::default());

        let err = mdc.register_order("BTCUSDT", 1, 1).unwrap_err();
        assert!(matches!(err, BookError::RegistryDisabled { .. }));
        let err = mdc.register_order("XRPUSDT", 1, 1).unwrap_err();
        assert!(matches!(err, BookError::UnknownInstrument(_)));
    }
}
