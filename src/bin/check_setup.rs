use anyhow::Result;
use lecture_transcriber::{AudioExtractor, TranscriptionConfig, TranscriptionEngine};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("lecture_transcriber=info,check_setup=info")
        .init();

    info!("🔍 Checking lecture transcription setup...");

    let config = match TranscriptionConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration could not be loaded: {}", e);
            std::process::exit(1);
        }
    };
    for line in config.summary().lines() {
        info!("   {}", line);
    }

    // Local-only processing is a hard requirement
    if let Err(e) = config.validate() {
        error!("❌ {}", e);
        std::process::exit(1);
    }
    info!("🔒 Processing mode is local; media never leaves this host");

    let extractor = AudioExtractor::from_config(&config);
    if extractor.check_available().await {
        info!("✅ {} available for video audio extraction", extractor.ffmpeg_binary());
    } else {
        error!("❌ {} not found; video lectures cannot be transcribed", extractor.ffmpeg_binary());
        info!("💡 Install ffmpeg or set FFMPEG_BINARY");
    }

    info!("🧠 Loading speech model...");
    match TranscriptionEngine::load(config.clone()).await {
        Ok(engine) => {
            info!("✅ Model {} ready", engine.model_name());
        }
        Err(e) => {
            error!("❌ {}", e);
            info!("💡 Recommendation: Install whisper.cpp and download a model:");
            info!("   git clone https://github.com/ggerganov/whisper.cpp.git");
            info!("   cd whisper.cpp && cmake -B build && cmake --build build -j");
            info!("   ./models/download-ggml-model.sh {}", config.model_size().ggml_name());
            info!("   Then set WHISPER_MODEL_DIR to the directory holding {}", config.model_file_name());
            std::process::exit(1);
        }
    }

    info!("🎉 All transcription components ready!");
    info!("💡 To transcribe a lecture, use: lecture-transcriber --audio /path/to/lecture.mp3");

    Ok(())
}
