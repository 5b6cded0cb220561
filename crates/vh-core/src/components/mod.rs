mod nginx;
pub mod processes;
mod proxy;
mod static_files;
pub mod supervisor_conf;

pub use nginx::{fcgi_socket, render_website, NginxWebserver};
pub use processes::{Processes, ProcessesConfig, WebsiteProcess};
pub use proxy::ReverseProxy;
pub use static_files::StaticFiles;
