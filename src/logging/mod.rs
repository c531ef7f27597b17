//! Asynchronous file logging.
//!
//! `log` macros run on hot paths, so the [`AsyncWriter`] installed into
//! `env_logger` only pushes formatted records onto an unbounded channel.
//! A background task drains the channel into a buffered file.

use std::io::{self, Write};

use env_logger::Builder;
use log::LevelFilter;
use tokio::{
    fs::{create_dir_all, metadata, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
        watch,
    },
};

use crate::config;

pub struct AsyncWriter {
    sender: UnboundedSender<Vec<u8>>,
}

impl Write for AsyncWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let data = buf.to_vec();
        self.sender
            .send(data)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Logger {
    sender: UnboundedSender<Vec<u8>>,
    receiver: UnboundedReceiver<Vec<u8>>,
    config: config::Log,
}

impl Logger {
    pub fn new(config: config::Log) -> Self {
        let (sender, receiver) = unbounded_channel::<Vec<u8>>();
        Self {
            sender,
            receiver,
            config,
        }
    }

    fn create_async_writer(&self) -> AsyncWriter {
        AsyncWriter {
            sender: self.sender.clone(),
        }
    }

    pub fn init_env_logger(&self) {
        let writer = self.create_async_writer();
        Builder::from_env(env_logger::Env::default())
            .filter(None, LevelFilter::Info)
            .target(env_logger::Target::Pipe(Box::new(writer)))
            .init();
    }

    /// Drains log records into the configured file until `shutdown` flips
    /// to `true` or every [`AsyncWriter`] has been dropped. Run this on a
    /// background task.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
        let Logger {
            sender,
            mut receiver,
            config,
        } = self;
        // Writers hold their own clones; keeping this one alive would stop
        // the channel from ever closing.
        drop(sender);

        let log_file_path = &config.path;

        if let Some(parent) = std::path::Path::new(log_file_path).parent() {
            if metadata(parent).await.is_err() {
                create_dir_all(parent).await?;
            }
        }

        let mut file = BufWriter::new(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(log_file_path)
                .await?,
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                },

                data = receiver.recv() => {
                    match data {
                        Some(data) => {
                            file.write_all(&data).await?;
                        }
                        None => break,
                    }
                }
            }
        }

        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_reach_log_file() {
        let path = std::env::temp_dir().join(format!("reqflow-log-{}.txt", uuid::Uuid::new_v4()));
        let logger = Logger::new(config::Log {
            path: path.to_string_lossy().to_string(),
        });

        let mut writer = logger.create_async_writer();
        writer.write_all(b"first line\n").unwrap();
        writer.write_all(b"second line\n").unwrap();
        drop(writer);

        let (_tx, rx) = watch::channel(false);
        logger.run(rx).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("first line"));
        assert!(contents.contains("second line"));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[test]
    fn test_writer_reports_full_length() {
        let (sender, mut receiver) = unbounded_channel();
        let mut writer = AsyncWriter { sender };
        assert_eq!(writer.write(b"hello").unwrap(), 5);
        assert_eq!(receiver.try_recv().unwrap(), b"hello".to_vec());
    }
}
