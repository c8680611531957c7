use super::*;

impl TuiApp {
    /// Scans of a switched-to workspace never read or write the cache.
    pub(super) fn scan_request(&self, force_refresh: bool) -> ScanRequest {
        let (roots, use_cache) = match self.state.active_workspace() {
            Some(workspace) => (vec![workspace.to_path_buf()], false),
            None => (self.config.roots.clone(), true),
        };
        ScanRequest {
            roots,
            ignore: self.config.ignore.clone(),
            max_age: self.config.cache_max_age(),
            force_refresh,
            use_cache,
        }
    }

    pub(super) fn start_scan(&mut self, force_refresh: bool) {
        let request = self.scan_request(force_refresh);
        self.state.begin_scan();
        info!(
            roots = request.roots.len(),
            force_refresh,
            use_cache = request.use_cache,
            "Starting scan"
        );
        let (tx, rx) = mpsc::channel::<Result<ScanOutcome, String>>();
        // A superseded scan's sender fails silently once this receiver replaces it.
        self.scan_rx = Some(rx);
        let cache_path = self.cache_path.clone();
        let timeout = self.config.status_timeout();
        thread::spawn(move || {
            let inspector = GitStatusInspector::new(timeout);
            let mut cache = ResultCache::new(cache_path);
            let result =
                scan_with_cache(&request, &mut cache, &inspector).map_err(|err| err.to_string());
            let _ = tx.send(result);
        });
    }

    pub(super) fn poll_scan_events(&mut self) {
        let Some(rx) = self.scan_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(outcome)) => {
                info!(
                    count = outcome.repos.len(),
                    from_cache = outcome.from_cache,
                    "Scan completed"
                );
                self.state.scan_succeeded(outcome.repos, outcome.from_cache);
            }
            Ok(Err(err)) => {
                error!(error = %err, "Scan failed");
                self.state.scan_failed(err);
            }
            Err(mpsc::TryRecvError::Empty) => self.scan_rx = Some(rx),
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("Scan worker exited without a result");
                self.state.scan_failed("scan worker exited without a result");
            }
        }
    }
}
