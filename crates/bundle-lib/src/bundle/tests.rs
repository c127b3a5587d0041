//! Import tests against bundle trees built in a temp directory
//!
//! Each test lays out only the files it needs; everything else is absent,
//! which the importer must tolerate.

mod import_tests {
    use crate::attention::{compute_attention, Severity};
    use crate::bundle::{import_bundle, ImportOptions, Layout};
    use crate::error::ErrorKind;
    use crate::models::{LogFile, LogKind, PodPhase, ResourceKind};
    use crate::report::{artifacts, ArtifactStatus, ImportStatus};
    use chrono::{TimeZone, Utc};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use tokio::fs;

    const PODS_HEADER: &str = "NAMESPACE NAME READY STATUS RESTARTS AGE IP NODE\n";
    const EVENTS_HEADER: &str =
        "NAMESPACE LAST SEEN TYPE REASON OBJECT SUBOBJECT SOURCE MESSAGE FIRST SEEN COUNT NAME\n";

    fn options() -> ImportOptions {
        ImportOptions::default().with_now(Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap())
    }

    async fn write(root: &Path, relative: &str, content: impl AsRef<[u8]>) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, content).await.unwrap();
    }

    /// Bundle with a single pods row
    async fn bundle_with_pod(row: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "systeminfo/hostname", "worker-1\n").await;
        write(dir.path(), "rke2/kubectl/pods", format!("{}{}\n", PODS_HEADER, row)).await;
        dir
    }

    fn event_row(reason: &str, object: &str, count: u32) -> String {
        format!(
            "default 5m Warning {} {} <none> default-scheduler 0/3 nodes are available 10m {} evt.1",
            reason, object, count
        )
    }

    fn path_str(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[tokio::test]
    async fn test_healthy_cluster() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();

        let pods = bundle.list_pods(None);
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "nginx-abc");
        assert_eq!(pods[0].phase, PodPhase::Running);
        assert_eq!(pods[0].ready.as_deref(), Some("1/1"));
        assert_eq!(bundle.manifest().node_name, "worker-1");
        assert_eq!(bundle.root().layout(), Layout::Direct);
        assert!(bundle.etcd_health().is_none());
        assert!(compute_attention(&bundle).is_empty());
    }

    #[tokio::test]
    async fn test_crashloop_is_critical() {
        let dir =
            bundle_with_pod("default nginx-abc 0/1 CrashLoopBackOff 0 5d 10.0.0.1 worker-1").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].severity, Severity::Critical);
        assert_eq!(items[0].kind, ResourceKind::Pod);
        assert_eq!(items[0].title, "nginx-abc");
        assert_eq!(items[0].description, "CrashLoopBackOff");
        assert_eq!(items[0].namespace, "default");
    }

    #[tokio::test]
    async fn test_restart_storm_is_warning() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 7 5d 10.0.0.1 worker-1").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].severity, Severity::Warning);
        assert_eq!(items[0].description, "7 restarts");
        assert_eq!(items[0].count, 7);
    }

    #[tokio::test]
    async fn test_restart_annotation_is_skipped() {
        let dir = bundle_with_pod(
            "default nginx-abc 1/1 Running 4 (5m ago) 5d 10.0.0.1 worker-1",
        )
        .await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let pod = bundle.list_pods(Some("default"))[0];

        assert_eq!(pod.restarts, 4);
        assert_eq!(pod.age, "5d");
        assert_eq!(pod.ip, "10.0.0.1");
        assert_eq!(pod.node, "worker-1");
    }

    #[tokio::test]
    async fn test_not_ready_running_pod() {
        let dir = bundle_with_pod("default web 1/2 Running 0 5d 10.0.0.1 worker-1").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Not ready (1/2)");
    }

    #[tokio::test]
    async fn test_etcd_alarm() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;
        write(dir.path(), "etcd/alarmlist", "memberID:1 alarm:NOSPACE\n").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].severity, Severity::Critical);
        assert_eq!(items[0].title, "ETCD");
        assert_eq!(items[0].description, "ALARM: NOSPACE");
        assert_eq!(items[0].count, 1);
    }

    /// (severity, title, description) per item, in engine order
    fn triage(bundle: &crate::bundle::Bundle) -> Vec<(Severity, String, String)> {
        compute_attention(bundle)
            .into_iter()
            .map(|i| (i.severity, i.title, i.description))
            .collect()
    }

    fn critical(title: &str, description: &str) -> (Severity, String, String) {
        (Severity::Critical, title.to_string(), description.to_string())
    }

    #[tokio::test]
    async fn test_critical_pod_phases() {
        let dir = bundle_with_pod(
            "default oom-1 0/1 OOMKilled 0 5d 10.0.0.1 worker-1\n\
             default pull-1 0/1 ErrImagePull 0 5d 10.0.0.2 worker-1\n\
             default init-1 0/1 Init:Error 0 5d 10.0.0.3 worker-1\n\
             default job-1 0/1 Failed 0 5d 10.0.0.4 worker-1\n\
             default evicted-1 0/1 Evicted 0 5d <none> worker-1",
        )
        .await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();

        assert_eq!(
            triage(&bundle),
            vec![
                critical("oom-1", "OOMKilled"),
                critical("pull-1", "ImagePullBackOff"),
                critical("init-1", "Error state"),
                critical("job-1", "Error state"),
                critical("evicted-1", "Evicted"),
            ]
        );
    }

    #[tokio::test]
    async fn test_restart_threshold_boundary() {
        let dir = bundle_with_pod(
            "default two 1/1 Running 2 5d 10.0.0.1 worker-1\n\
             default three 1/1 Running 3 5d 10.0.0.2 worker-1\n\
             default done 0/1 Completed 3 5d 10.0.0.3 worker-1",
        )
        .await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "done"]);
        assert!(items.iter().all(|i| i.severity == Severity::Warning));
        assert!(items.iter().all(|i| i.description == "3 restarts" && i.count == 3));
    }

    #[tokio::test]
    async fn test_cluster_health_rules() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;
        write(
            dir.path(),
            "rke2/kubectl/nodes",
            "NAME STATUS ROLES AGE VERSION\n\
             worker-1 Ready worker 5d v1.28.3\n\
             worker-2 Unknown worker 5d v1.28.3\n",
        )
        .await;
        write(
            dir.path(),
            "rke2/kubectl/daemonsets",
            "NAMESPACE NAME DESIRED CURRENT READY UP-TO-DATE AVAILABLE AGE\n\
             kube-system canal 3 2 2 2 2 5d\n\
             kube-system proxy 3 3 3 3 3 5d\n",
        )
        .await;
        write(dir.path(), "etcd/alarmlist", "").await;
        write(
            dir.path(),
            "etcd/endpointhealth",
            "https://127.0.0.1:2379 is unhealthy: failed to commit proposal\n",
        )
        .await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);

        assert_eq!(
            triage(&bundle),
            vec![
                critical("worker-2", "Unknown"),
                critical("ETCD", "Unhealthy endpoints"),
                (Severity::Warning, "canal".to_string(), "2/3 ready".to_string()),
            ]
        );
        assert_eq!(items[0].kind, ResourceKind::Node);
        assert_eq!(items[1].kind, ResourceKind::Etcd);
        assert_eq!(items[2].kind, ResourceKind::DaemonSet);
        assert_eq!(items[2].namespace, "kube-system");
    }

    async fn bundle_with_pressure(memory_used: u32, disk_percent: u32) -> TempDir {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;
        write(
            dir.path(),
            "systeminfo/freem",
            format!(
                "              total        used        free\nMem:            100 {:>11} {:>11}\n",
                memory_used,
                100 - memory_used
            ),
        )
        .await;
        write(
            dir.path(),
            "systeminfo/dfh",
            format!(
                "Filesystem Size Used Avail Use% Mounted on\n/dev/sda1 50G 40G 10G {}% /\n",
                disk_percent
            ),
        )
        .await;
        dir
    }

    #[tokio::test]
    async fn test_system_pressure_thresholds_are_strict() {
        let at_limit = bundle_with_pressure(90, 85).await;
        let bundle = import_bundle(path_str(at_limit.path()), &options()).await.unwrap();
        assert!(bundle.system_health().is_some());
        assert!(compute_attention(&bundle).is_empty());

        let over = bundle_with_pressure(91, 86).await;
        let bundle = import_bundle(path_str(over.path()), &options()).await.unwrap();
        let info = |title: &str, description: &str| {
            (Severity::Info, title.to_string(), description.to_string())
        };
        assert_eq!(
            triage(&bundle),
            vec![
                info("Memory", "91% used on worker-1"),
                info("Disk", "86% of / used on worker-1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_severity_order_across_tiers() {
        let dir = bundle_with_pressure(10, 90).await;
        write(
            dir.path(),
            "rke2/kubectl/pods",
            format!(
                "{}default web-1 1/1 Running 5 5d 10.0.0.1 worker-1\n\
                 default oom-1 0/1 OOMKilled 0 5d 10.0.0.2 worker-1\n\
                 default api-1 1/2 Running 0 5d 10.0.0.3 worker-1\n\
                 default evicted-1 0/1 Evicted 0 5d <none> worker-1\n",
                PODS_HEADER
            ),
        )
        .await;
        write(
            dir.path(),
            "rke2/kubectl/nodes",
            "NAME STATUS\nworker-1 Ready\nworker-2 NotReady\n",
        )
        .await;
        write(
            dir.path(),
            "rke2/kubectl/daemonsets",
            "NAMESPACE NAME DESIRED CURRENT READY\nkube-system canal 2 1 1\n",
        )
        .await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);

        let order: Vec<_> = items
            .iter()
            .map(|i| (i.severity, i.title.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Severity::Critical, "oom-1"),
                (Severity::Critical, "evicted-1"),
                (Severity::Critical, "worker-2"),
                (Severity::Warning, "web-1"),
                (Severity::Warning, "api-1"),
                (Severity::Warning, "canal"),
                (Severity::Info, "Disk"),
            ]
        );
    }

    #[tokio::test]
    async fn test_event_aggregation() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;
        let mut events = String::from(EVENTS_HEADER);
        for i in 0..6 {
            events.push_str(&event_row("FailedScheduling", &format!("pod/web-{}", i), 1));
            events.push('\n');
        }
        events.push_str(&event_row("Unhealthy", "pod/db-0", 3));
        events.push('\n');
        events.push_str(&event_row("Unhealthy", "pod/db-1", 3));
        events.push('\n');
        for _ in 0..4 {
            events.push_str(&event_row("BackOff", "pod/cache-0", 1));
            events.push('\n');
        }
        write(dir.path(), "rke2/kubectl/events", events).await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);
        let headlines: Vec<_> = items.iter().map(|i| i.headline()).collect();

        assert_eq!(
            headlines,
            vec![
                "6 Warning events – FailedScheduling",
                "6 Warning events – Unhealthy",
            ]
        );
        assert!(items.iter().all(|i| i.severity == Severity::Warning));
        assert!(items[0].tag.is_some());
        assert!(items[1].tag.is_none());
    }

    #[tokio::test]
    async fn test_wrapped_layout() {
        let outer = TempDir::new().unwrap();
        let inner = outer.path().join("node-2025-01-01");
        write(
            &inner,
            "rke2/kubectl/pods",
            format!("{}default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1\n", PODS_HEADER),
        )
        .await;
        write(&inner, "rke2/kubectl/nodes", "NAME STATUS\nworker-1 Ready\n").await;

        let bundle = import_bundle(path_str(outer.path()), &options()).await.unwrap();

        assert_eq!(bundle.root().layout(), Layout::Wrapped);
        assert_eq!(bundle.root().path(), inner.as_path());
        assert_eq!(bundle.manifest().node_name, "node-2025-01-01");
        assert_eq!(bundle.list_pods(None).len(), 1);
        assert_eq!(bundle.list_nodes().len(), 1);
        assert_eq!(bundle.report().status(), ImportStatus::Complete);
    }

    #[tokio::test]
    async fn test_malformed_table_degrades_with_warning() {
        let dir = bundle_with_pod("default truncated").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let report = bundle.report();

        assert!(bundle.list_pods(None).is_empty());
        assert_eq!(report.status(), ImportStatus::Partial);
        assert_eq!(report.degraded_artifacts(), vec![artifacts::PODS]);
        assert_eq!(report.warnings()[0].artifact, artifacts::PODS);
    }

    #[tokio::test]
    async fn test_absent_artifacts_are_not_warnings() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let report = bundle.report();

        assert!(report.warnings().is_empty());
        assert_eq!(
            report.status_of(artifacts::PODS),
            Some(&ArtifactStatus::Loaded { count: 1 })
        );
        assert_eq!(
            report.status_of(artifacts::EVENTS),
            Some(&ArtifactStatus::Absent)
        );
        assert_eq!(report.status_of(artifacts::ETCD), Some(&ArtifactStatus::Absent));
    }

    #[tokio::test]
    async fn test_events_attach_to_pods() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;
        let events = format!(
            "{}{}\n{}\n",
            EVENTS_HEADER,
            event_row("FailedMount", "pod/nginx-abc", 1),
            event_row("FailedMount", "deployment/nginx", 1),
        );
        write(dir.path(), "rke2/kubectl/events", events).await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let pod = bundle.list_pods(None)[0];

        assert_eq!(bundle.list_all_events().len(), 2);
        assert_eq!(
            pod.events.as_deref(),
            Some(&["0/3 nodes are available".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_log_only_pods_are_added() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "rke2/podlogs/kube-system_coredns-1_coredns.log", "ready\n").await;
        write(
            dir.path(),
            "rke2/podlogs/kube-system_coredns-1_coredns-previous.log",
            "panic\n",
        )
        .await;
        write(dir.path(), "rke2/podlogs/not_a_log.txt", "x").await;
        write(dir.path(), "systemlogs/kubelet.log", "I0101 started\n").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let pods = bundle.list_pods(Some("kube-system"));

        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].status, "Unknown");
        assert_eq!(pods[0].containers, vec!["coredns".to_string()]);
        assert!(pods[0].has_current_logs);
        assert!(pods[0].has_previous_logs);
        assert_eq!(bundle.pod_logs("kube-system", "coredns-1").len(), 2);
        assert_eq!(bundle.log_files().len(), 3);
        assert!(bundle
            .log_files()
            .iter()
            .any(|l| l.kind == LogKind::Kubelet));
        assert_eq!(
            bundle.report().status_of(artifacts::PODS),
            Some(&ArtifactStatus::Absent)
        );
    }

    #[tokio::test]
    async fn test_size_cap_rejects_before_parsing() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;

        let err = import_bundle(
            path_str(dir.path()),
            &options().with_max_uncompressed_bytes(16),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SizeExceeded);
        assert!(err.elaboration.is_none());
    }

    #[tokio::test]
    async fn test_manifest_counts_files() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;
        write(dir.path(), "rke2/version", "rke2 version v1.28.3+rke2r1 (abc)\n").await;
        write(
            dir.path(),
            "rke2/kubectl/version",
            "Client Version: version.Info{Major:\"1\", GitVersion:\"v1.28.3+rke2r1\"}\n",
        )
        .await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let manifest = bundle.manifest();

        assert_eq!(manifest.file_count, 4);
        assert!(manifest.total_bytes > 0);
        assert_eq!(manifest.rke2_version, "rke2 version v1.28.3+rke2r1 (abc)");
        assert_eq!(manifest.k8s_version, "v1.28.3+rke2r1");
        assert_eq!(manifest.bundle_type, "rke2");
    }

    #[tokio::test]
    async fn test_log_listing_filters() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "rke2/podlogs/default_web_app.log", "a\n").await;
        write(dir.path(), "rke2/podlogs/default_web_app-previous.log", "b\n").await;
        write(dir.path(), "rke2/podlogs/kube-system_web_proxy.log", "c\n").await;
        write(dir.path(), "systemlogs/kubelet.log", "d\n").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();

        assert_eq!(bundle.list_log_files(None, None).len(), 4);
        assert_eq!(bundle.list_log_files(Some("all"), None).len(), 4);
        assert_eq!(bundle.list_log_files(Some("all"), Some("web")).len(), 3);
        assert_eq!(bundle.list_log_files(None, Some("web")).len(), 3);
        assert_eq!(bundle.list_log_files(Some("default"), None).len(), 2);
        assert_eq!(bundle.list_log_files(Some("c-abc12:default"), Some("web")).len(), 2);
        assert_eq!(bundle.list_log_files(Some("kube-system"), Some("web")).len(), 1);
        assert!(bundle.list_log_files(Some("default"), Some("db")).is_empty());
    }

    #[tokio::test]
    async fn test_read_log_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "rke2/podlogs/default_web_app.log", "hello\n").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let log = bundle.pod_logs("default", "web")[0].clone();
        assert_eq!(bundle.read_log_file(&log).await.unwrap(), b"hello\n");

        let stranger = LogFile {
            path: PathBuf::from("/nonexistent/default_other_app.log"),
            ..log
        };
        let err = bundle.read_log_file(&stranger).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LogFileNotFound);
    }

    #[tokio::test]
    async fn test_garbage_bytes_never_fault() {
        let garbage: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let dir = TempDir::new().unwrap();
        for name in [
            "crds", "deployments", "services", "namespaces", "pods", "events", "nodes",
            "daemonsets", "version",
        ] {
            write(dir.path(), &format!("rke2/kubectl/{}", name), &garbage).await;
        }
        write(dir.path(), "rke2/version", &garbage).await;
        write(dir.path(), "etcd/alarmlist", &garbage).await;
        write(dir.path(), "etcd/endpointhealth", &garbage).await;
        write(dir.path(), "systeminfo/freem", &garbage).await;
        write(dir.path(), "systeminfo/dfh", &garbage).await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let items = compute_attention(&bundle);

        assert!(items.windows(2).all(|w| w[0].severity <= w[1].severity));
        assert!(bundle.list_all_events().iter().all(|e| e.count >= 1));
    }

    #[tokio::test]
    async fn test_triage_is_deterministic() {
        let dir =
            bundle_with_pod("default nginx-abc 0/1 CrashLoopBackOff 9 5d 10.0.0.1 worker-1").await;
        write(dir.path(), "rke2/kubectl/nodes", "NAME STATUS\nworker-1 NotReady\n").await;
        write(dir.path(), "systeminfo/freem", "              total        used\nMem:          1000         950\n").await;

        let first = import_bundle(path_str(dir.path()), &options()).await.unwrap();
        let second = import_bundle(path_str(dir.path()), &options()).await.unwrap();

        let items = compute_attention(&first);
        assert_eq!(items, compute_attention(&first));
        assert_eq!(items, compute_attention(&second));
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].kind, ResourceKind::Pod);
        assert_eq!(items[1].kind, ResourceKind::Node);
        assert_eq!(items[2].severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_verbose_error_elaboration() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let err = import_bundle(path_str(&missing), &options().with_verbose(true))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        let elaboration = err.elaboration.unwrap();
        assert!(elaboration.contains("not_found"));
        assert!(elaboration.contains(path_str(&missing)));
        assert!(elaboration.contains("working dir"));
        assert!(elaboration.contains("hint:"));
    }

    #[tokio::test]
    async fn test_find_resolves_references() {
        let dir = bundle_with_pod("default nginx-abc 1/1 Running 0 5d 10.0.0.1 worker-1").await;

        let bundle = import_bundle(path_str(dir.path()), &options()).await.unwrap();

        let found = bundle.find(ResourceKind::Pod, "default", "nginx-abc").unwrap();
        assert_eq!(found.kind(), ResourceKind::Pod);
        assert!(bundle.find(ResourceKind::Pod, "other", "nginx-abc").is_none());
        assert!(bundle.find(ResourceKind::Etcd, "", "").is_none());
    }
}
