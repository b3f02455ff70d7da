//! 출력 파일 관리자 -- 크기 기반 로테이션과 큐 영속화
//!
//! 캡처된 라인은 [`EventQueue`]에 쌓였다가 `flush()` 시점에
//! `captured_logs_<N>.txt`에 추가됩니다. N은 1부터 시작하며 프로세스 수명 동안
//! 감소하지 않습니다.
//!
//! # 로테이션
//! - flush 시작 시 한 번만 검사합니다 (라인 단위 아님).
//! - 현재 파일이 존재하고 크기가 임계값 이상이면 N을 올립니다.
//!   이미 가득 찬 파일이 연속으로 있으면 빈 번호까지 건너뜁니다.
//! - 이전 파일은 삭제하거나 합치지 않습니다.
//!
//! # 실패 처리
//! 쓰기 에러가 나면 그 flush는 중단됩니다. 라인마다 flush로 기록을 확인하며,
//! 확인된 라인만 큐에서 제거되고 나머지는 다음 flush에서 재시도됩니다.

use std::path::{Path, PathBuf};

use logcap_core::metrics as m;
use tokio::io::AsyncWriteExt;

use crate::error::CaptureError;
use crate::queue::EventQueue;

/// 출력 파일 이름 접두
pub const OUTPUT_FILE_PREFIX: &str = "captured_logs";

/// 출력 파일 상태와 대기 큐
#[derive(Debug)]
pub struct OutputFileManager {
    dir: PathBuf,
    sequence: u64,
    current_size: u64,
    threshold: u64,
    queue: EventQueue,
}

impl OutputFileManager {
    /// 출력 관리자를 생성합니다. 파일은 첫 non-empty flush 때 생성됩니다.
    pub fn new(dir: impl Into<PathBuf>, threshold: u64, max_queue_lines: usize) -> Self {
        Self {
            dir: dir.into(),
            sequence: 1,
            current_size: 0,
            threshold,
            queue: EventQueue::new(max_queue_lines),
        }
    }

    /// 출력 라인을 큐에 추가합니다.
    pub fn enqueue(&self, line: impl Into<String>) {
        self.queue.push(line);
    }

    /// 큐 전체를 현재 출력 파일에 기록하고 기록한 라인 수를 반환합니다.
    ///
    /// 큐가 비어 있으면 아무것도 하지 않습니다 (파일 생성, 로테이션 검사 없음).
    pub async fn flush(&mut self) -> Result<usize, CaptureError> {
        let batch = self.queue.snapshot();
        if batch.is_empty() {
            return Ok(0);
        }

        match self.write_batch(&batch).await {
            Ok(written) => {
                metrics::counter!(m::LINES_WRITTEN_TOTAL).increment(written as u64);
                tracing::debug!(
                    file = %self.current_path().display(),
                    written,
                    size = self.current_size,
                    "flushed captured lines"
                );
                Ok(written)
            }
            Err(e) => {
                metrics::counter!(m::FLUSH_ERRORS_TOTAL).increment(1);
                Err(e)
            }
        }
    }

    async fn write_batch(&mut self, batch: &[String]) -> Result<usize, CaptureError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CaptureError::Write {
                path: self.dir.clone(),
                source,
            })?;
        self.rotate_if_needed().await?;

        let path = self.current_path();
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| CaptureError::Write {
                path: path.clone(),
                source,
            })?;

        // tokio의 write_all은 백그라운드 쓰기에 넘기기만 하므로
        // flush가 성공한 라인만 기록된 것으로 센다
        let mut written = 0;
        for line in batch {
            let entry = format!("{line}\n");
            let result = match file.write_all(entry.as_bytes()).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };
            if let Err(source) = result {
                self.queue.remove_front(written);
                return Err(CaptureError::Write { path, source });
            }
            written += 1;
            self.current_size += entry.len() as u64;
        }
        self.queue.remove_front(written);

        file.sync_data()
            .await
            .map_err(|source| CaptureError::Write { path, source })?;
        Ok(written)
    }

    /// 현재 출력 파일의 실제 크기를 다시 읽습니다.
    ///
    /// 재시작 직후 이미 내용이 있는 파일을 이어 쓸 때 상태 보고가 맞도록
    /// 엔진 생성과 재설정 시 호출됩니다. 파일이 없으면 0입니다.
    pub async fn refresh_size(&mut self) {
        let path = self.current_path();
        self.current_size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "failed to stat output file");
                self.current_size
            }
        };
    }

    /// 현재 파일이 임계값 이상이면 존재하지 않거나 여유가 있는 번호까지 올립니다.
    async fn rotate_if_needed(&mut self) -> Result<(), CaptureError> {
        loop {
            let path = self.current_path();
            let size = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    self.current_size = 0;
                    return Ok(());
                }
                Err(source) => return Err(CaptureError::Write { path, source }),
            };

            if size < self.threshold {
                self.current_size = size;
                return Ok(());
            }

            self.sequence += 1;
            metrics::counter!(m::OUTPUT_ROTATIONS_TOTAL).increment(1);
            tracing::info!(
                previous = %path.display(),
                size,
                threshold = self.threshold,
                file = %self.current_file_name(),
                "rotating output file"
            );
        }
    }

    /// 출력 디렉토리, 임계값, 큐 용량을 변경합니다.
    ///
    /// 파일 번호와 대기 중인 라인은 유지됩니다.
    pub fn reconfigure(&mut self, dir: impl Into<PathBuf>, threshold: u64, max_queue_lines: usize) {
        let dir = dir.into();
        if dir != self.dir {
            tracing::info!(
                previous = %self.dir.display(),
                current = %dir.display(),
                "output directory changed"
            );
            self.dir = dir;
            self.current_size = 0;
        }
        self.threshold = threshold;
        self.queue.set_capacity(max_queue_lines);
    }

    /// 현재 출력 파일 이름
    pub fn current_file_name(&self) -> String {
        format!("{OUTPUT_FILE_PREFIX}_{}.txt", self.sequence)
    }

    /// 현재 출력 파일 경로
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(self.current_file_name())
    }

    /// 현재 파일 크기 (바이트, 마지막 flush 또는 `refresh_size` 기준)
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// 로테이션 임계값 (바이트)
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// 현재 파일 번호
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// 출력 디렉토리
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 대기 큐
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn empty_flush_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("captured");
        let mut manager = OutputFileManager::new(&out, 0, 100);

        assert_eq!(manager.flush().await.unwrap(), 0);
        assert_eq!(manager.flush().await.unwrap(), 0);
        assert!(!out.exists());
        assert_eq!(manager.sequence(), 1);
    }

    #[tokio::test]
    async fn flush_appends_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = OutputFileManager::new(dir.path(), 1024, 100);
        manager.enqueue("MATCH [ERROR]: a");
        manager.enqueue("CONTEXT [ERROR]: b");

        assert_eq!(manager.flush().await.unwrap(), 2);
        assert!(manager.queue().is_empty());
        assert_eq!(
            read(&dir.path().join("captured_logs_1.txt")),
            "MATCH [ERROR]: a\nCONTEXT [ERROR]: b\n"
        );
        assert_eq!(manager.current_size(), 36);
    }

    #[tokio::test]
    async fn rotates_when_threshold_reached() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = OutputFileManager::new(dir.path(), 10, 100);

        manager.enqueue("0123456789");
        manager.flush().await.unwrap();
        manager.enqueue("next");
        manager.flush().await.unwrap();

        assert_eq!(manager.current_file_name(), "captured_logs_2.txt");
        assert_eq!(read(&dir.path().join("captured_logs_1.txt")), "0123456789\n");
        assert_eq!(read(&dir.path().join("captured_logs_2.txt")), "next\n");
    }

    #[tokio::test]
    async fn rotation_is_checked_once_per_flush() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = OutputFileManager::new(dir.path(), 5, 100);
        for line in ["first line", "second line", "third line"] {
            manager.enqueue(line);
        }
        manager.flush().await.unwrap();

        assert_eq!(manager.sequence(), 1);
        assert_eq!(
            read(&dir.path().join("captured_logs_1.txt")).lines().count(),
            3
        );
    }

    #[tokio::test]
    async fn zero_threshold_rotates_every_non_empty_flush() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = OutputFileManager::new(dir.path(), 0, 100);

        for expected in 1..=3 {
            manager.enqueue(format!("line {expected}"));
            manager.flush().await.unwrap();
            assert_eq!(manager.sequence(), expected);
        }
        // 빈 flush는 번호를 올리지 않음
        manager.flush().await.unwrap();
        assert_eq!(manager.sequence(), 3);
    }

    #[tokio::test]
    async fn skips_existing_full_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("captured_logs_1.txt"), "full file\n").unwrap();
        std::fs::write(dir.path().join("captured_logs_2.txt"), "also full\n").unwrap();

        let mut manager = OutputFileManager::new(dir.path(), 5, 100);
        manager.enqueue("fresh");
        manager.flush().await.unwrap();

        assert_eq!(manager.sequence(), 3);
        assert_eq!(read(&dir.path().join("captured_logs_1.txt")), "full file\n");
        assert_eq!(read(&dir.path().join("captured_logs_3.txt")), "fresh\n");
    }

    #[tokio::test]
    async fn appends_to_existing_file_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("captured_logs_1.txt"), "old\n").unwrap();

        let mut manager = OutputFileManager::new(dir.path(), 1024, 100);
        manager.enqueue("new");
        manager.flush().await.unwrap();

        assert_eq!(read(&dir.path().join("captured_logs_1.txt")), "old\nnew\n");
        assert_eq!(manager.current_size(), 8);
    }

    #[tokio::test]
    async fn failed_flush_keeps_lines_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("captured");
        // 디렉토리 자리에 일반 파일이 있으면 create_dir_all 실패
        std::fs::write(&out, "").unwrap();

        let mut manager = OutputFileManager::new(&out, 1024, 100);
        manager.enqueue("kept 1");
        manager.enqueue("kept 2");

        let err = manager.flush().await.unwrap_err();
        assert!(matches!(err, CaptureError::Write { .. }));
        assert_eq!(manager.queue().snapshot(), vec!["kept 1", "kept 2"]);

        std::fs::remove_file(&out).unwrap();
        assert_eq!(manager.flush().await.unwrap(), 2);
        assert_eq!(read(&out.join("captured_logs_1.txt")), "kept 1\nkept 2\n");
    }

    #[tokio::test]
    async fn reconfigure_keeps_sequence_and_queue() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = OutputFileManager::new(dir.path().join("a"), 0, 100);
        manager.enqueue("one");
        manager.flush().await.unwrap();
        manager.enqueue("two");
        manager.flush().await.unwrap();
        assert_eq!(manager.sequence(), 2);

        manager.enqueue("queued");
        manager.reconfigure(dir.path().join("b"), 1024, 100);
        assert_eq!(manager.sequence(), 2);
        assert_eq!(manager.queue().len(), 1);
        assert_eq!(manager.threshold(), 1024);

        manager.flush().await.unwrap();
        assert_eq!(read(&dir.path().join("b").join("captured_logs_2.txt")), "queued\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unconfirmed_writes_stay_queued() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(full, dir.path().join("captured_logs_1.txt")).unwrap();

        let mut manager = OutputFileManager::new(dir.path(), 1024, 100);
        manager.enqueue("first");
        manager.enqueue("second");

        let err = manager.flush().await.unwrap_err();
        assert!(matches!(err, CaptureError::Write { .. }));
        assert_eq!(manager.queue().snapshot(), vec!["first", "second"]);
        assert_eq!(manager.current_size(), 0);
    }

    #[tokio::test]
    async fn refresh_size_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = OutputFileManager::new(dir.path(), 1024, 100);
        manager.refresh_size().await;
        assert_eq!(manager.current_size(), 0);

        std::fs::write(dir.path().join("captured_logs_1.txt"), "earlier run\n").unwrap();
        manager.refresh_size().await;
        assert_eq!(manager.current_size(), 12);
    }
}
