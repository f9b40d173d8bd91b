//! Docker API 추상화 -- 실행 중인 이미지 스냅샷과 레이어 조회
//!
//! [`DockerClient`] 트레이트가 bollard Docker API를 감싸므로, 프로덕션 코드는
//! [`BollardDockerClient`]를, 테스트는 `MockDockerClient`를 사용합니다.
//!
//! ```text
//!   audit / check
//!        │
//!        ▼
//!  ┌─────────────┐
//!  │DockerClient │ (trait)
//!  └─────────────┘
//!     │       │
//!     ▼       ▼
//!  Bollard   Mock
//!     │
//!     ▼
//!  Docker Daemon
//! ```
//!
//! 스냅샷은 실행 중인 컨테이너만 대상으로 하며, 여러 컨테이너가 같은 이미지를
//! 사용하더라도 이미지 이름은 한 번만 포함됩니다.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use imagewarden_core::config::DockerConfig;

use crate::error::ImagePolicyError;

/// Docker API 연산 추상화
///
/// `Send + Sync + 'static`이므로 비동기 컨텍스트 간에 안전하게 공유할 수 있습니다.
///
/// # 에러 처리
///
/// - **404 응답**: `ImagePolicyError::ImageNotFound`
/// - **연결 실패**: `ImagePolicyError::DockerConnection`
/// - **기타 API 실패**: `ImagePolicyError::DockerApi`
pub trait DockerClient: Send + Sync + 'static {
    /// 실행 중인 컨테이너들이 사용하는 이미지 이름 집합을 반환합니다.
    ///
    /// 이미지 이름은 Docker가 보고한 그대로입니다 (`nginx:latest`, `sha256:...` 등).
    fn list_running_images(
        &self,
    ) -> impl Future<Output = Result<BTreeSet<String>, ImagePolicyError>> + Send;

    /// 이미지의 rootfs 레이어 digest 목록을 반환합니다 (하위 레이어부터).
    fn image_layers(
        &self,
        image: &str,
    ) -> impl Future<Output = Result<Vec<String>, ImagePolicyError>> + Send;

    /// Docker 데몬 연결 상태를 확인합니다.
    fn ping(&self) -> impl Future<Output = Result<(), ImagePolicyError>> + Send;
}

/// bollard 기반 프로덕션 Docker 클라이언트
///
/// 내부적으로 `Arc<bollard::Docker>`를 사용하여 태스크 간 공유가 가능합니다.
///
/// 모든 API 호출은 `timeout`으로 제한되며, 만료 시 `ImagePolicyError::DockerApi`를 반환합니다.
#[derive(Clone)]
pub struct BollardDockerClient {
    docker: Arc<bollard::Docker>,
    timeout: Duration,
}

impl BollardDockerClient {
    /// 플랫폼 기본 소켓으로 Docker에 연결합니다.
    ///
    /// `DOCKER_HOST` 환경 변수가 설정되어 있으면 그 주소를 사용합니다.
    ///
    /// # Errors
    ///
    /// 소켓이 없거나 권한이 없으면 `ImagePolicyError::DockerConnection`.
    pub fn connect_local(timeout: Duration) -> Result<Self, ImagePolicyError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            ImagePolicyError::DockerConnection(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self {
            docker: Arc::new(docker.with_timeout(timeout)),
            timeout,
        })
    }

    /// 지정한 소켓 경로로 Docker에 연결합니다.
    ///
    /// # Errors
    ///
    /// 연결 설정 실패 시 `ImagePolicyError::DockerConnection`.
    pub fn connect_with_socket(
        socket_path: &str,
        timeout: Duration,
    ) -> Result<Self, ImagePolicyError> {
        let docker = bollard::Docker::connect_with_socket(
            socket_path,
            timeout.as_secs(),
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| {
            ImagePolicyError::DockerConnection(format!(
                "failed to connect to docker at {socket_path}: {e}"
            ))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
            timeout,
        })
    }

    /// 설정에 따라 연결합니다. 소켓이 비어있으면 플랫폼 기본값을 사용합니다.
    pub fn from_config(config: &DockerConfig) -> Result<Self, ImagePolicyError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let socket = config.socket.trim();
        if socket.is_empty() {
            Self::connect_local(timeout)
        } else {
            Self::connect_with_socket(socket, timeout)
        }
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T, ImagePolicyError>
    where
        F: Future<Output = Result<T, ImagePolicyError>>,
    {
        tokio::time::timeout(self.timeout, fut).await.map_err(|_| {
            ImagePolicyError::DockerApi(format!(
                "{operation} timed out after {}s",
                self.timeout.as_secs()
            ))
        })?
    }
}

impl DockerClient for BollardDockerClient {
    async fn list_running_images(&self) -> Result<BTreeSet<String>, ImagePolicyError> {
        use bollard::container::ListContainersOptions;

        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };

        let containers = self
            .bounded("list containers", async {
                self.docker
                    .list_containers(Some(options))
                    .await
                    .map_err(|e| {
                        ImagePolicyError::DockerApi(format!("list containers failed: {e}"))
                    })
            })
            .await?;

        let mut images = BTreeSet::new();
        for container in containers {
            match container.image {
                Some(image) if !image.is_empty() => {
                    images.insert(image);
                }
                _ => {
                    tracing::info!(
                        container_id = container.id.as_deref().unwrap_or("unknown"),
                        "running container without image name skipped"
                    );
                }
            }
        }

        tracing::debug!(count = images.len(), "collected running images");
        Ok(images)
    }

    async fn image_layers(&self, image: &str) -> Result<Vec<String>, ImagePolicyError> {
        let details = self
            .bounded("inspect image", async {
                self.docker.inspect_image(image).await.map_err(|e| match e {
                    bollard::errors::Error::DockerResponseServerError {
                        status_code: 404, ..
                    } => ImagePolicyError::ImageNotFound(image.to_owned()),
                    other => ImagePolicyError::DockerApi(format!(
                        "inspect image '{image}' failed: {other}"
                    )),
                })
            })
            .await?;

        Ok(details
            .root_fs
            .and_then(|root_fs| root_fs.layers)
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), ImagePolicyError> {
        // An unanswered ping means the daemon is unreachable, not an API failure
        tokio::time::timeout(self.timeout, self.docker.ping())
            .await
            .map_err(|_| {
                ImagePolicyError::DockerConnection(format!(
                    "ping timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ImagePolicyError::DockerConnection(format!("ping failed: {e}")))?;
        Ok(())
    }
}

/// 이미지 목록의 레이어를 조회합니다.
///
/// 스냅샷과 조회 사이에 사라진 이미지(`ImageNotFound`)는 건너뛰고,
/// 그 외 에러는 즉시 전파합니다.
pub async fn collect_image_layers<C, I, T>(
    client: &C,
    images: I,
) -> Result<BTreeMap<String, Vec<String>>, ImagePolicyError>
where
    C: DockerClient,
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut layers = BTreeMap::new();
    for image in images {
        let image = image.as_ref();
        match client.image_layers(image).await {
            Ok(digests) => {
                layers.insert(image.to_owned(), digests);
            }
            Err(ImagePolicyError::ImageNotFound(_)) => {
                tracing::info!(image, "image disappeared before layer lookup, skipped");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(layers)
}

/// 테스트용 Mock Docker 클라이언트
///
/// 설정 가능한 응답을 반환하여 Docker 없이도 테스트할 수 있습니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockDockerClient {
    /// 실행 중인 컨테이너들의 이미지 (중복 허용)
    pub running: Vec<String>,
    /// 이미지별 레이어
    pub layers: BTreeMap<String, Vec<String>>,
    /// 데몬 연결 실패를 시뮬레이션할지 여부
    pub unreachable: bool,
}

#[cfg(test)]
impl MockDockerClient {
    /// 빈 mock 클라이언트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 실행 중인 컨테이너 하나를 추가합니다.
    pub fn with_container(mut self, image: &str) -> Self {
        self.running.push(image.to_owned());
        self
    }

    /// 이미지 레이어를 등록합니다.
    pub fn with_layers(mut self, image: &str, layers: &[&str]) -> Self {
        self.layers.insert(
            image.to_owned(),
            layers.iter().map(|l| (*l).to_owned()).collect(),
        );
        self
    }

    /// 모든 호출이 연결 실패하도록 설정합니다.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    fn check_reachable(&self) -> Result<(), ImagePolicyError> {
        if self.unreachable {
            return Err(ImagePolicyError::DockerConnection(
                "mock daemon unreachable".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
impl DockerClient for MockDockerClient {
    async fn list_running_images(&self) -> Result<BTreeSet<String>, ImagePolicyError> {
        self.check_reachable()?;
        Ok(self.running.iter().cloned().collect())
    }

    async fn image_layers(&self, image: &str) -> Result<Vec<String>, ImagePolicyError> {
        self.check_reachable()?;
        self.layers
            .get(image)
            .cloned()
            .ok_or_else(|| ImagePolicyError::ImageNotFound(image.to_owned()))
    }

    async fn ping(&self) -> Result<(), ImagePolicyError> {
        self.check_reachable()
    }
}
